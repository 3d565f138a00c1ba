pub mod scalar;
#[cfg(all(target_arch = "riscv64", target_feature = "v"))]
pub mod rvv;

/// Two 64-bit lanes: one `e64, m1` register group at the minimum VLEN.
pub type Lanes = [u64; 2];

/// Element-wise kernel. Stores into the third argument and returns the number
/// of lanes the hardware processed.
pub type LaneOp = unsafe fn(&Lanes, &Lanes, &mut Lanes) -> usize;

/// True when the target declares the vector extension, i.e. the build may
/// emit vector instructions at all.
pub const VECTOR_INTRINSICS: bool = cfg!(all(target_arch = "riscv64", target_feature = "v"));

#[derive(Clone, Copy)]
pub struct Kernels {
    pub xor: LaneOp,
    pub add: LaneOp,
}

#[cfg(all(target_arch = "riscv64", target_feature = "v"))]
pub fn vector_kernels() -> Option<Kernels> {
    Some(Kernels {
        xor: rvv::xor_u64x2,
        add: rvv::add_u64x2,
    })
}

#[cfg(not(all(target_arch = "riscv64", target_feature = "v")))]
pub fn vector_kernels() -> Option<Kernels> {
    None
}

/// Fallback path for builds without the vector extension.
pub fn scalar_kernels() -> Kernels {
    Kernels {
        xor: wrapper_xor,
        add: wrapper_add,
    }
}

unsafe fn wrapper_xor(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
    scalar::xor(a, b, out)
}

unsafe fn wrapper_add(a: &Lanes, b: &Lanes, out: &mut Lanes) -> usize {
    scalar::add(a, b, out)
}
