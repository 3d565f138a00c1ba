use super::Lanes;
use std::arch::asm;

// Each kernel sets vl for two e64 lanes, loads both operands into v8/v9,
// combines them and stores v8. V guarantees VLEN >= 128, so vl is 2.

#[inline]
pub unsafe fn xor_u64x2(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
    let vl: usize;
    asm!(
        "vsetivli {vl}, 2, e64, m1, ta, ma",
        "vle64.v v8, ({a})",
        "vle64.v v9, ({b})",
        "vxor.vv v8, v8, v9",
        "vse64.v v8, ({dst})",
        vl = out(reg) vl,
        a = in(reg) a.as_ptr(),
        b = in(reg) b.as_ptr(),
        dst = in(reg) out.as_mut_ptr(),
        out("v8") _,
        out("v9") _,
        options(nostack),
    );
    vl
}

#[inline]
pub unsafe fn add_u64x2(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
    let vl: usize;
    asm!(
        "vsetivli {vl}, 2, e64, m1, ta, ma",
        "vle64.v v8, ({a})",
        "vle64.v v9, ({b})",
        "vadd.vv v8, v8, v9",
        "vse64.v v8, ({dst})",
        vl = out(reg) vl,
        a = in(reg) a.as_ptr(),
        b = in(reg) b.as_ptr(),
        dst = in(reg) out.as_mut_ptr(),
        out("v8") _,
        out("v9") _,
        options(nostack),
    );
    vl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rvv_matches_scalar() {
        let a = [0x1234567890ABCDEF, 0xFEDCBA0987654321];
        let b = [0xAAAAAAAAAAAAAAAA, 0x5555555555555555];

        let mut vector = [0; 2];
        let mut scalar = [0; 2];

        unsafe {
            assert_eq!(xor_u64x2(&a, &b, &mut vector), 2);
        }
        crate::simd::scalar::xor(&a, &b, &mut scalar);
        assert_eq!(vector, scalar);

        unsafe {
            add_u64x2(&[100, 200], &[50, 75], &mut vector);
        }
        assert_eq!(vector, [150, 275]);
    }
}
