use derive_more::Display;

/// Reasons a CPF (Brazilian individual taxpayer number) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CpfError {
    #[display(fmt = "CPF must have 11 digits and cannot repeat a single digit")]
    InvalidFormat,
    #[display(fmt = "CPF check digits do not match")]
    ChecksumMismatch,
}

impl std::error::Error for CpfError {}

const CPF_LEN: usize = 11;

/// Validates a CPF written with or without punctuation (`529.982.247-25`).
///
/// Returns the 11 digits with the punctuation stripped, which is the form
/// stored on the employee row.
pub fn validate_cpf(input: &str) -> Result<String, CpfError> {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LEN {
        return Err(CpfError::InvalidFormat);
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return Err(CpfError::InvalidFormat);
    }

    let first = check_digit(&digits[..9]);
    let mut ten = digits[..9].to_vec();
    ten.push(first);
    let second = check_digit(&ten);

    if digits[9] != first || digits[10] != second {
        return Err(CpfError::ChecksumMismatch);
    }

    Ok(digits.iter().map(|d| char::from_digit(*d, 10).unwrap_or('0')).collect())
}

/// Weighted sum mod 11; weights run from `len + 1` down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .zip((2..=top).rev())
        .map(|(d, w)| d * w)
        .sum();

    let rest = 11 - sum % 11;
    if rest >= 10 { 0 } else { rest }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: [&str; 3] = ["52998224725", "11144477735", "390.533.447-05"];

    #[test]
    fn accepts_valid_numbers_with_or_without_punctuation() {
        assert_eq!(validate_cpf("529.982.247-25"), Ok("52998224725".to_string()));
        for cpf in VALID {
            assert!(validate_cpf(cpf).is_ok(), "{cpf} should be valid");
        }
    }

    #[test]
    fn mutated_check_digits_fail_the_checksum() {
        for cpf in VALID {
            let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();
            for position in [9, 10] {
                for bump in 1..10 {
                    let mut mutated = digits.clone();
                    mutated[position] = (mutated[position] + bump) % 10;
                    let text: String = mutated
                        .iter()
                        .map(|d| char::from_digit(*d, 10).unwrap())
                        .collect();
                    assert_eq!(
                        validate_cpf(&text),
                        Err(CpfError::ChecksumMismatch),
                        "{text} should fail"
                    );
                }
            }
        }
    }

    #[test]
    fn repeated_digits_are_invalid_format() {
        for d in 0..10 {
            let cpf = d.to_string().repeat(11);
            assert_eq!(validate_cpf(&cpf), Err(CpfError::InvalidFormat));
        }
    }

    #[test]
    fn wrong_length_is_invalid_format() {
        assert_eq!(validate_cpf(""), Err(CpfError::InvalidFormat));
        assert_eq!(validate_cpf("5299822472"), Err(CpfError::InvalidFormat));
        assert_eq!(validate_cpf("529982247250"), Err(CpfError::InvalidFormat));
        assert_eq!(validate_cpf("abc.def.ghi-jk"), Err(CpfError::InvalidFormat));
    }

    #[test]
    fn remainder_of_ten_or_more_maps_to_zero() {
        assert_eq!(check_digit(&[0; 9]), 0);
        // 5 * 9 = 45, 45 % 11 = 1, 11 - 1 = 10
        assert_eq!(check_digit(&[0, 5, 0, 0, 0, 0, 0, 0, 0]), 0);
        assert_eq!(check_digit(&[5, 2, 9, 9, 8, 2, 2, 4, 7]), 2);
    }
}
