//! Deliberate crash trigger
//!
//! Operational convenience for verifying the whole pipeline: panics only
//! when handed the secret code generated for this run. Isolated from the
//! decoder and notifier.

use rand::Rng;

pub struct CrashTester {
    code: u32,
}

impl CrashTester {
    pub fn new() -> Self {
        Self {
            code: rand::thread_rng().gen_range(1000..=9999),
        }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    /// Panic when `arg` matches the secret code; otherwise return the hint
    /// message telling the operator how to trigger the crash.
    pub fn trigger(&self, arg: Option<u32>) -> String {
        if arg == Some(self.code) {
            panic!("Crashing server deliberately");
        }

        format!(
            "Caution! This command will crash the server if used appropriately. \
             To intentionally crash the server, run it again with this code: {}",
            self.code
        )
    }
}

impl Default for CrashTester {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_four_digits() {
        for _ in 0..100 {
            let tester = CrashTester::new();
            assert!((1000..=9999).contains(&tester.code()));
        }
    }

    #[test]
    fn test_wrong_code_returns_hint() {
        let tester = CrashTester::new();
        let hint = tester.trigger(None);
        assert!(hint.contains(&tester.code().to_string()));

        // A mismatched code must not crash either.
        let wrong = if tester.code() == 9999 { 1000 } else { tester.code() + 1 };
        let hint = tester.trigger(Some(wrong));
        assert!(hint.contains("Caution!"));
    }

    #[test]
    #[should_panic(expected = "Crashing server deliberately")]
    fn test_matching_code_panics() {
        let tester = CrashTester::new();
        tester.trigger(Some(tester.code()));
    }
}
