use super::Lanes;

pub fn xor(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x ^ y;
    }
    out.len()
}

pub fn add(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x.wrapping_add(*y);
    }
    out.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_xor() {
        let mut out = [0; 2];
        assert_eq!(xor(&[0b1100, u64::MAX], &[0b1010, 0], &mut out), 2);
        assert_eq!(out, [0b0110, u64::MAX]);
    }

    #[test]
    fn test_scalar_add_wraps() {
        let mut out = [0; 2];
        add(&[100, u64::MAX], &[50, 1], &mut out);
        assert_eq!(out, [150, 0]);
    }
}
