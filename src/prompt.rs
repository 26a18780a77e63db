use std::io::{self, BufRead, Write};

pub const OVERWRITE_QUESTION: &str =
    "The target folder already exists. Do you want to overwrite it? (yes/no) ";

/// Ask on the terminal whether an existing day folder may be written into.
pub fn confirm_overwrite() -> bool {
    ask(OVERWRITE_QUESTION, &mut io::stdin().lock(), &mut io::stdout())
}

/// Anything but an affirmative answer, including EOF or an I/O error, is a no.
pub fn ask(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    if write!(output, "{question}").and_then(|_| output.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => is_affirmative(&answer),
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        for answer in ["yes\n", "YES", " Yes \r\n", "y", "Y\n"] {
            assert!(is_affirmative(answer), "{answer:?}");
        }
        for answer in ["no\n", "", "\n", "yeah", "n", "ok"] {
            assert!(!is_affirmative(answer), "{answer:?}");
        }
    }

    #[test]
    fn test_ask_writes_question() {
        let mut input = "yes\n".as_bytes();
        let mut output = Vec::new();
        assert!(ask(OVERWRITE_QUESTION, &mut input, &mut output));
        assert_eq!(String::from_utf8(output).unwrap(), OVERWRITE_QUESTION);
    }

    #[test]
    fn test_ask_eof_is_no() {
        let mut input = "".as_bytes();
        assert!(!ask(OVERWRITE_QUESTION, &mut input, &mut io::sink()));
    }
}
