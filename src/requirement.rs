//! The connectivity requirement (C4, spec §4.4): a tiny grammar over
//! four named terms, and the threshold formula evaluated against it.

use crate::clusterer::ClustererKind;
use crate::error::{RefinerError, Result};

/// `R = α·log10 + β·mcd + γ·k + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requirement {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub c: f64,
}

impl Requirement {
    /// `(0, 0, 0, 2)`: a cluster is accepted only when every mincut is
    /// strictly greater than 2.
    pub fn most_stringent() -> Requirement {
        Requirement {
            alpha: 0.0,
            beta: 0.0,
            gamma: 0.0,
            c: 2.0,
        }
    }

    /// Parses `term ("+" term)*` where `term := number ("log10" | "mcd" | "k")?`.
    /// Whitespace is ignored; a bare number accumulates into `c`; each
    /// named coefficient may appear at most once.
    pub fn parse(input: &str) -> Result<Requirement> {
        let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if stripped.is_empty() {
            return Err(RefinerError::InputValidation(
                "empty threshold expression".to_string(),
            ));
        }

        let mut alpha = 0.0;
        let mut beta = 0.0;
        let mut gamma = 0.0;
        let mut c = 0.0;
        let (mut has_alpha, mut has_beta, mut has_gamma) = (false, false, false);

        for term in stripped.split('+') {
            if term.is_empty() {
                return Err(RefinerError::InputValidation(format!(
                    "empty term in threshold expression: {input}"
                )));
            }
            let (value, suffix) = split_number_suffix(term)?;
            match suffix {
                "log10" => {
                    if has_alpha {
                        return Err(dup_err(input, "log10"));
                    }
                    has_alpha = true;
                    alpha = value;
                }
                "mcd" => {
                    if has_beta {
                        return Err(dup_err(input, "mcd"));
                    }
                    has_beta = true;
                    beta = value;
                }
                "k" => {
                    if has_gamma {
                        return Err(dup_err(input, "k"));
                    }
                    has_gamma = true;
                    gamma = value;
                }
                "" => c += value,
                other => {
                    return Err(RefinerError::InputValidation(format!(
                        "unrecognized term suffix {other:?} in fragment {term:?} of {input:?}"
                    )));
                }
            }
        }

        Ok(Requirement {
            alpha,
            beta,
            gamma,
            c,
        })
    }

    /// At least one of `(α, β, γ, c)` must be positive; none may be
    /// negative; `γ` must be zero unless the IKC clusterer is in use.
    pub fn is_valid(&self, clusterer: ClustererKind) -> bool {
        let non_negative = self.alpha >= 0.0 && self.beta >= 0.0 && self.gamma >= 0.0 && self.c >= 0.0;
        let has_positive = self.alpha > 0.0 || self.beta > 0.0 || self.gamma > 0.0 || self.c > 0.0;
        let gamma_ok = self.gamma == 0.0 || matches!(clusterer, ClustererKind::Ikc);
        non_negative && has_positive && gamma_ok
    }

    /// `T = α·log10(n) + β·mcd + γ·k + c`. `mcd_override`, when given,
    /// replaces `mcd(cluster)` (the pruner's hypothetical-degree use).
    /// `k` only contributes when `clusterer` is the IKC variant.
    pub fn threshold(&self, clusterer: ClustererKind, n: usize, mcd: u64, k: Option<u32>) -> f64 {
        let log_term = if n > 0 {
            self.alpha * (n as f64).log10()
        } else {
            0.0
        };
        let mcd_term = self.beta * mcd as f64;
        let k_term = match clusterer {
            ClustererKind::Ikc => self.gamma * k.unwrap_or(0) as f64,
            _ => 0.0,
        };
        log_term + mcd_term + k_term + self.c
    }
}

fn dup_err(input: &str, name: &str) -> RefinerError {
    RefinerError::InputValidation(format!(
        "named coefficient {name:?} appears more than once in threshold expression {input:?}"
    ))
}

/// Splits a term like `"2mcd"` into `(2.0, "mcd")`, or `"42"` into `(42.0, "")`.
/// A leading `-` is not part of the grammar: every coefficient in `R`
/// is non-negative (spec §3), so `-5k` is rejected rather than parsed
/// into a negative `gamma`.
fn split_number_suffix(term: &str) -> Result<(f64, &str)> {
    let split_at = term
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(term.len());
    let (number, suffix) = term.split_at(split_at);
    let value: f64 = number.parse().map_err(|_| {
        RefinerError::InputValidation(format!("malformed number in fragment {term:?}"))
    })?;
    match suffix {
        "log10" | "mcd" | "k" | "" => Ok((value, suffix)),
        other => Err(RefinerError::InputValidation(format!(
            "unrecognized term suffix {other:?} in fragment {term:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_log10_term() {
        let r = Requirement::parse("1log10").unwrap();
        assert_eq!(r, Requirement { alpha: 1.0, beta: 0.0, gamma: 0.0, c: 0.0 });
    }

    #[test]
    fn parses_all_four_terms() {
        let r = Requirement::parse("2mcd+10k+1log10+42").unwrap();
        assert_eq!(
            r,
            Requirement { alpha: 1.0, beta: 2.0, gamma: 10.0, c: 42.0 }
        );
    }

    #[test]
    fn bare_numbers_accumulate_into_c() {
        let r = Requirement::parse("42+3k").unwrap();
        assert_eq!(r, Requirement { alpha: 0.0, beta: 0.0, gamma: 3.0, c: 42.0 });
    }

    #[test]
    fn ignores_whitespace() {
        let r = Requirement::parse(" 1 log10 + 2 ").unwrap();
        assert_eq!(r, Requirement { alpha: 1.0, beta: 0.0, gamma: 0.0, c: 2.0 });
    }

    #[test]
    fn rejects_duplicate_named_term() {
        let err = Requirement::parse("1log10+2log10").unwrap_err();
        assert!(matches!(err, RefinerError::InputValidation(_)));
    }

    #[test]
    fn rejects_malformed_fragment() {
        let err = Requirement::parse("1potato").unwrap_err();
        assert!(matches!(err, RefinerError::InputValidation(_)));
    }

    #[test]
    fn rejects_negative_term() {
        let err = Requirement::parse("-5k").unwrap_err();
        assert!(matches!(err, RefinerError::InputValidation(_)));
    }

    #[test]
    fn is_valid_rejects_a_negative_coefficient() {
        let r = Requirement { alpha: 0.0, beta: 0.0, gamma: 0.0, c: -1.0 };
        assert!(!r.is_valid(ClustererKind::ModMod));
    }

    #[test]
    fn sanity_requires_a_positive_coefficient() {
        let zero = Requirement { alpha: 0.0, beta: 0.0, gamma: 0.0, c: 0.0 };
        assert!(!zero.is_valid(ClustererKind::Ikc));
    }

    #[test]
    fn sanity_rejects_gamma_outside_ikc() {
        let r = Requirement { alpha: 0.0, beta: 0.0, gamma: 1.0, c: 0.0 };
        assert!(!r.is_valid(ClustererKind::ModMod));
        assert!(r.is_valid(ClustererKind::Ikc));
    }

    #[test]
    fn most_stringent_rejects_small_cuts_only() {
        let r = Requirement::most_stringent();
        assert_eq!(r.threshold(ClustererKind::ModMod, 10, 0, None), 2.0);
    }
}
