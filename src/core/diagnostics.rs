use crate::simd::{self, Kernels, LaneOp, Lanes};
use tracing::{info, warn};

/// Vector round-trip checks run by the self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Xor,
    Add,
}

impl Check {
    pub const ALL: [Check; 2] = [Check::Xor, Check::Add];

    pub fn label(self) -> &'static str {
        match self {
            Check::Xor => "XOR",
            Check::Add => "ADD",
        }
    }

    /// Fixed operands. ADD inputs are small enough that no lane overflows.
    pub fn inputs(self) -> (Lanes, Lanes) {
        match self {
            Check::Xor => (
                [0x1234567890ABCDEF, 0xFEDCBA0987654321],
                [0xAAAAAAAAAAAAAAAA, 0x5555555555555555],
            ),
            Check::Add => ([100, 200], [50, 75]),
        }
    }

    /// Reference result, computed without going through any kernel.
    pub fn expected(self, a: &Lanes, b: &Lanes) -> Lanes {
        match self {
            Check::Xor => [a[0] ^ b[0], a[1] ^ b[1]],
            Check::Add => [a[0] + b[0], a[1] + b[1]],
        }
    }

    fn kernel(self, kernels: &Kernels) -> LaneOp {
        match self {
            Check::Xor => kernels.xor,
            Check::Add => kernels.add,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub check: Check,
    pub a: Lanes,
    pub b: Lanes,
    /// Lanes the kernel reported processing.
    pub vl: usize,
    pub result: Lanes,
    pub expected: Lanes,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.result == self.expected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Vector path exercised and every check matched.
    Verified = 0,
    /// Toolchain/target has no vector extension; use the scalar path.
    Unavailable = 1,
    /// Vector path exercised but at least one check disagreed.
    Mismatch = 2,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug)]
pub enum SelfTest {
    Exercised(Vec<CheckOutcome>),
    Unavailable,
}

impl SelfTest {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            SelfTest::Exercised(outcomes) if outcomes.iter().all(CheckOutcome::passed) => {
                ExitStatus::Verified
            }
            SelfTest::Exercised(_) => ExitStatus::Mismatch,
            SelfTest::Unavailable => ExitStatus::Unavailable,
        }
    }
}

pub struct Diagnostics;

impl Diagnostics {
    /// Runs both checks on the build's vector kernels, or reports that there
    /// are none. No vector instruction executes in the latter case.
    pub fn self_test() -> SelfTest {
        match simd::vector_kernels() {
            Some(kernels) => SelfTest::Exercised(Self::run_all(&kernels)),
            None => {
                warn!("vector extension not available, scalar fallback required");
                SelfTest::Unavailable
            }
        }
    }

    /// Every check runs, whatever the previous ones returned.
    pub fn run_all(kernels: &Kernels) -> Vec<CheckOutcome> {
        Check::ALL
            .iter()
            .map(|&check| Self::run_check(check, check.kernel(kernels)))
            .collect()
    }

    pub fn run_check(check: Check, op: LaneOp) -> CheckOutcome {
        let (a, b) = check.inputs();
        let mut result = [0; 2];

        // SAFETY: kernels in `simd` only touch the three 2-lane buffers, and
        // vector ones are only handed out when the target enables them.
        let vl = unsafe { op(&a, &b, &mut result) };

        let outcome = CheckOutcome {
            check,
            a,
            b,
            vl,
            result,
            expected: check.expected(&a, &b),
        };

        if outcome.passed() {
            info!(check = check.label(), vl, "vector check passed");
        } else {
            warn!(
                check = check.label(),
                vl,
                result = ?outcome.result,
                expected = ?outcome.expected,
                "vector check mismatch"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn broken_xor(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
        // Drops the second lane, like a kernel run with vl = 1.
        out[0] = a[0] ^ b[0];
        1
    }

    #[test]
    fn test_xor_expected_values() {
        let (a, b) = Check::Xor.inputs();
        assert_eq!(Check::Xor.expected(&a, &b), [a[0] ^ b[0], a[1] ^ b[1]]);
        assert_eq!(
            Check::Xor.expected(&a, &b),
            [0xB89EFCD23A016745, 0xAB89EF5CD2301674]
        );
    }

    #[test]
    fn test_add_expected_values() {
        let (a, b) = Check::Add.inputs();
        assert_eq!(Check::Add.expected(&a, &b), [150, 275]);
    }

    #[test]
    fn test_scalar_kernels_pass_every_check() {
        let outcomes = Diagnostics::run_all(&simd::scalar_kernels());
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(CheckOutcome::passed));
        assert!(outcomes.iter().all(|o| o.vl == 2));
        assert_eq!(SelfTest::Exercised(outcomes).exit_status(), ExitStatus::Verified);
    }

    #[test]
    fn test_failing_check_does_not_stop_the_next() {
        let kernels = Kernels {
            xor: broken_xor,
            ..simd::scalar_kernels()
        };
        let outcomes = Diagnostics::run_all(&kernels);

        assert_eq!(outcomes[0].check, Check::Xor);
        assert!(!outcomes[0].passed());
        assert_eq!(outcomes[0].vl, 1);

        assert_eq!(outcomes[1].check, Check::Add);
        assert!(outcomes[1].passed());

        assert_eq!(SelfTest::Exercised(outcomes).exit_status(), ExitStatus::Mismatch);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Verified.code(), 0);
        assert_eq!(ExitStatus::Unavailable.code(), 1);
        assert_eq!(ExitStatus::Mismatch.code(), 2);
    }

    #[test]
    fn test_self_test_matches_build_target() {
        let run = Diagnostics::self_test();
        if simd::VECTOR_INTRINSICS {
            assert_eq!(run.exit_status(), ExitStatus::Verified);
        } else {
            assert!(matches!(run, SelfTest::Unavailable));
            assert_ne!(run.exit_status().code(), 0);
        }
    }
}
