//! Hardware Detection Module
//! Translates the per-platform signals into one `CapabilityRecord`.

use crate::core::config::ProbeConfig;
use crate::core::record::{CapabilityRecord, Flags};
use crate::core::signals::{HostSignals, Signals, AT_HWCAP, AT_HWCAP2};
use tracing::{debug, info};

// aarch64: asm/hwcap.h
pub const HWCAP_AES: u64 = 1 << 3;
pub const HWCAP_PMULL: u64 = 1 << 4;
// 32-bit ARM reports crypto in the second word.
pub const HWCAP2_AES: u64 = 1 << 0;
pub const HWCAP2_PMULL: u64 = 1 << 1;

// ID_AA64ISAR0_EL1.AES, bits [7:4]
pub const ID_AA64ISAR0_AES_SHIFT: u32 = 4;
pub const ID_AA64ISAR0_AES_BASE: u64 = 0x1;
pub const ID_AA64ISAR0_AES_PMULL: u64 = 0x2;

/// One detection policy per architecture/OS family.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, signals: &dyn Signals, config: &ProbeConfig) -> CapabilityRecord;
}

/// Steps every ARM build on a POSIX OS runs after the crypto probe.
fn arm_posix(record: &mut CapabilityRecord, signals: &dyn Signals, config: &ProbeConfig) {
    if let Some(name) = signals.arm_name() {
        record.set_brand(&name);
    }
    record.mark(Flags::PDPE1GB, signals.can_read(&config.hugepage_control));
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RiscvStrategy;

impl Strategy for RiscvStrategy {
    fn name(&self) -> &'static str {
        "riscv"
    }

    fn detect(&self, signals: &dyn Signals, config: &ProbeConfig) -> CapabilityRecord {
        let mut record = CapabilityRecord::new();

        if let Some(name) = signals.riscv_name() {
            record.set_brand(&name);
        }
        record.mark(Flags::AES, signals.riscv_crypto());
        record.mark(Flags::RVV, signals.riscv_vector());
        record.mark(Flags::PDPE1GB, signals.can_read(&config.hugepage_control));

        record
    }
}

/// aarch64 BSDs: AES level straight from `ID_AA64ISAR0_EL1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArmBsdStrategy;

impl ArmBsdStrategy {
    pub fn aes_field(isar0: u64) -> u64 {
        (isar0 >> ID_AA64ISAR0_AES_SHIFT) & 0xf
    }
}

impl Strategy for ArmBsdStrategy {
    fn name(&self) -> &'static str {
        "arm-bsd"
    }

    fn detect(&self, signals: &dyn Signals, config: &ProbeConfig) -> CapabilityRecord {
        let mut record = CapabilityRecord::new();

        if let Some(isar0) = signals.id_aa64isar0() {
            let field = Self::aes_field(isar0);
            debug!(isar0 = format_args!("{isar0:#018x}"), field, "ID_AA64ISAR0_EL1");
            record.mark(Flags::AES, field >= ID_AA64ISAR0_AES_BASE);
            record.mark(Flags::PMULL, field >= ID_AA64ISAR0_AES_PMULL);
        }
        arm_posix(&mut record, signals, config);

        record
    }
}

/// ARM on auxv-capable kernels: AES bit of the hardware capability word.
#[derive(Debug, Clone, Copy)]
pub struct ArmAuxvStrategy {
    key: u64,
    aes: u64,
    pmull: u64,
}

impl ArmAuxvStrategy {
    pub const AARCH64: Self = Self {
        key: AT_HWCAP,
        aes: HWCAP_AES,
        pmull: HWCAP_PMULL,
    };

    pub const ARM32: Self = Self {
        key: AT_HWCAP2,
        aes: HWCAP2_AES,
        pmull: HWCAP2_PMULL,
    };
}

impl Strategy for ArmAuxvStrategy {
    fn name(&self) -> &'static str {
        "arm-auxv"
    }

    fn detect(&self, signals: &dyn Signals, config: &ProbeConfig) -> CapabilityRecord {
        let mut record = CapabilityRecord::new();

        let hwcap = signals.auxv(self.key);
        debug!(key = self.key, hwcap = format_args!("{hwcap:#x}"), "auxv");
        record.mark(Flags::AES, hwcap & self.aes != 0);
        record.mark(Flags::PMULL, hwcap & self.pmull != 0);
        arm_posix(&mut record, signals, config);

        record
    }
}

/// ARM built without declared crypto support: name and huge pages only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArmPosixStrategy;

impl Strategy for ArmPosixStrategy {
    fn name(&self) -> &'static str {
        "arm-posix"
    }

    fn detect(&self, signals: &dyn Signals, config: &ProbeConfig) -> CapabilityRecord {
        let mut record = CapabilityRecord::new();
        arm_posix(&mut record, signals, config);
        record
    }
}

/// Every other build. Nothing is probed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackStrategy;

impl Strategy for FallbackStrategy {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn detect(&self, _signals: &dyn Signals, _config: &ProbeConfig) -> CapabilityRecord {
        CapabilityRecord::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Riscv,
    Aarch64,
    Arm,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux or Android: crypto bits come from the auxiliary vector.
    Linux,
    /// The only BSD that emulates EL0 reads of the ID registers.
    FreeBsd,
    OtherUnix,
    Other,
}

impl Arch {
    pub fn current() -> Self {
        if cfg!(any(target_arch = "riscv64", target_arch = "riscv32")) {
            Arch::Riscv
        } else if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else {
            Arch::Other
        }
    }
}

impl Os {
    pub fn current() -> Self {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            Os::Linux
        } else if cfg!(target_os = "freebsd") {
            Os::FreeBsd
        } else if cfg!(unix) {
            Os::OtherUnix
        } else {
            Os::Other
        }
    }
}

/// RISC-V wins over ARM, and the crypto-declared ARM variants win over the
/// plain POSIX one.
pub fn select_for(arch: Arch, crypto: bool, os: Os) -> &'static dyn Strategy {
    match (arch, crypto, os) {
        (Arch::Riscv, _, _) => &RiscvStrategy,
        (Arch::Aarch64, true, Os::FreeBsd) => &ArmBsdStrategy,
        (Arch::Aarch64, true, Os::Linux) => &ArmAuxvStrategy::AARCH64,
        (Arch::Arm, true, Os::Linux) => &ArmAuxvStrategy::ARM32,
        (Arch::Aarch64 | Arch::Arm, _, Os::Linux | Os::FreeBsd | Os::OtherUnix) => &ArmPosixStrategy,
        _ => &FallbackStrategy,
    }
}

/// Strategy for the current build target.
pub fn select() -> &'static dyn Strategy {
    select_for(Arch::current(), cfg!(target_feature = "aes"), Os::current())
}

/// Probes the running machine with the default configuration.
pub fn detect() -> CapabilityRecord {
    detect_with(&HostSignals, &ProbeConfig::default())
}

/// Probes through `signals`. Never fails: anything that cannot be observed
/// stays unset.
pub fn detect_with(signals: &dyn Signals, config: &ProbeConfig) -> CapabilityRecord {
    let strategy = select();
    let mut record = strategy.detect(signals, config);

    if let Some(brand) = &config.brand_override {
        record.set_brand(brand);
    }

    info!(
        strategy = strategy.name(),
        brand = %record.brand(),
        flags = ?record.flags(),
        "CPU capabilities detected"
    );
    record
}
