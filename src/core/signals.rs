//! Raw hardware and OS signals consumed by the detector.
//!
//! Every query here may fail (missing procfs, foreign OS, no permission). The
//! failures are logged and folded into the "unsupported" value before they
//! leave this module, so strategies only ever see plain booleans and options.

use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

// ELF auxiliary vector keys.
pub const AT_HWCAP: u64 = 16;
pub const AT_HWCAP2: u64 = 26;

const PROC_CPUINFO: &str = "/proc/cpuinfo";

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),
    #[error("Malformed {0}")]
    Parse(&'static str),
}

/// External collaborators of the detector. The defaults are the
/// "unsupported" answers, so a platform only overrides what it can observe.
pub trait Signals {
    fn arm_name(&self) -> Option<String> {
        None
    }

    fn riscv_name(&self) -> Option<String> {
        None
    }

    /// AES-bearing RISC-V crypto extension (Zkne/Zknd, Zvkned, ...).
    fn riscv_crypto(&self) -> bool {
        false
    }

    fn riscv_vector(&self) -> bool {
        false
    }

    /// Auxiliary vector entry, `0` when absent.
    fn auxv(&self, _key: u64) -> u64 {
        0
    }

    /// `ID_AA64ISAR0_EL1` as read on FreeBSD, which emulates the `mrs`.
    fn id_aa64isar0(&self) -> Option<u64> {
        None
    }

    /// Readable means openable for reading. Absent and permission-denied are
    /// both `false`.
    fn can_read(&self, path: &Path) -> bool {
        match File::open(path) {
            Ok(_) => true,
            Err(err) => {
                debug!(path = %path.display(), %err, "control file not readable");
                false
            }
        }
    }
}

/// Signals of the machine this process runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSignals;

impl Signals for HostSignals {
    fn arm_name(&self) -> Option<String> {
        sysinfo_brand().or_else(|| {
            let content = absorb("cpuinfo", read_cpuinfo())?;
            cpuinfo_field(&content, &["model name", "Hardware"]).map(str::to_string)
        })
    }

    fn riscv_name(&self) -> Option<String> {
        sysinfo_brand().or_else(|| {
            let content = absorb("cpuinfo", read_cpuinfo())?;
            cpuinfo_field(&content, &["model name", "uarch"]).map(str::to_string)
        })
    }

    fn riscv_crypto(&self) -> bool {
        host_isa().is_some_and(|isa| isa.has_aes())
    }

    fn riscv_vector(&self) -> bool {
        host_isa().is_some_and(|isa| isa.has_vector())
    }

    fn auxv(&self, key: u64) -> u64 {
        absorb("auxv", read_auxv(key)).unwrap_or(0)
    }

    fn id_aa64isar0(&self) -> Option<u64> {
        absorb("ID_AA64ISAR0_EL1", read_id_aa64isar0())
    }
}

fn absorb<T>(signal: &'static str, result: Result<T, SignalError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(signal, %err, "signal unavailable, treating as unsupported");
            None
        }
    }
}

fn sysinfo_brand() -> Option<String> {
    use sysinfo::{CpuRefreshKind, RefreshKind, System};

    let sys = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
    let brand = sys.cpus().first()?.brand().trim().to_string();
    if brand.is_empty() {
        None
    } else {
        Some(brand)
    }
}

fn read_cpuinfo() -> Result<String, SignalError> {
    Ok(fs::read_to_string(PROC_CPUINFO)?)
}

fn host_isa() -> Option<RiscvIsa> {
    let content = absorb("cpuinfo", read_cpuinfo())?;
    absorb("isa", RiscvIsa::from_cpuinfo(&content))
}

/// First non-empty value for the earliest key in `keys`.
pub fn cpuinfo_field<'a>(content: &'a str, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| {
        content.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            let value = value.trim();
            (name.trim() == *key && !value.is_empty()).then_some(value)
        })
    })
}

/// Parsed `isa` line of a RISC-V `/proc/cpuinfo`, e.g. `rv64imafdcv_zkne_zknd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiscvIsa {
    letters: String,
    extensions: Vec<String>,
}

impl RiscvIsa {
    /// ISA of the first hart as the kernel reports it.
    pub fn from_cpuinfo(content: &str) -> Result<Self, SignalError> {
        let isa = cpuinfo_field(content, &["isa"]).ok_or(SignalError::Parse("cpuinfo"))?;
        Self::parse(isa).ok_or(SignalError::Parse("isa string"))
    }

    pub fn parse(isa: &str) -> Option<Self> {
        let isa = isa.trim().to_ascii_lowercase();
        let rest = isa.strip_prefix("rv64").or_else(|| isa.strip_prefix("rv32"))?;

        let mut parts = rest.split('_');
        let letters = parts.next().unwrap_or_default().to_string();
        let extensions = parts.filter(|p| !p.is_empty()).map(str::to_string).collect();

        Some(Self { letters, extensions })
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }

    pub fn has_vector(&self) -> bool {
        self.letters.contains('v') || self.extensions.iter().any(|e| e.starts_with("zve"))
    }

    pub fn has_aes(&self) -> bool {
        let scalar = (self.has_extension("zkne") && self.has_extension("zknd"))
            || self.has_extension("zkn")
            || self.has_extension("zk");
        let vector = ["zvkned", "zvkn", "zvknc", "zvkng"]
            .iter()
            .any(|name| self.has_extension(name));
        scalar || vector
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn read_auxv(key: u64) -> Result<u64, SignalError> {
    // SAFETY: getauxval has no preconditions and returns 0 for absent keys.
    let value = unsafe { libc::getauxval(key as libc::c_ulong) };
    Ok(value as u64)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn read_auxv(_key: u64) -> Result<u64, SignalError> {
    Err(SignalError::Unsupported("auxv"))
}

#[cfg(all(target_arch = "aarch64", target_os = "freebsd"))]
fn read_id_aa64isar0() -> Result<u64, SignalError> {
    let value: u64;
    // SAFETY: FreeBSD traps EL0 reads of the ID registers and emulates them
    // with sanitized values. Other BSDs do not, the mrs would raise SIGILL.
    unsafe {
        std::arch::asm!(
            "mrs {}, ID_AA64ISAR0_EL1",
            out(reg) value,
            options(pure, nomem, nostack, preserves_flags)
        );
    }
    Ok(value)
}

#[cfg(not(all(target_arch = "aarch64", target_os = "freebsd")))]
fn read_id_aa64isar0() -> Result<u64, SignalError> {
    Err(SignalError::Unsupported("ID_AA64ISAR0_EL1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RISCV_CPUINFO: &str = "\
processor\t: 0
hart\t\t: 0
isa\t\t: rv64imafdcv_zicbom_zicboz_zkne_zknd_zknh
mmu\t\t: sv39
uarch\t\t: thead,c908
mvendorid\t: 0x5b7

";

    #[test]
    fn test_cpuinfo_field_respects_key_order() {
        assert_eq!(cpuinfo_field(RISCV_CPUINFO, &["model name", "uarch"]), Some("thead,c908"));
        assert_eq!(cpuinfo_field(RISCV_CPUINFO, &["mmu", "uarch"]), Some("sv39"));
        assert_eq!(cpuinfo_field(RISCV_CPUINFO, &["model name"]), None);
    }

    #[test]
    fn test_cpuinfo_field_skips_empty_values() {
        let content = "model name\t:\nHardware\t: BCM2835\n";
        assert_eq!(cpuinfo_field(content, &["model name", "Hardware"]), Some("BCM2835"));
    }

    #[test]
    fn test_riscv_isa_crypto_and_vector() {
        let isa = RiscvIsa::from_cpuinfo(RISCV_CPUINFO).unwrap();
        assert!(isa.has_vector());
        assert!(isa.has_aes());
        assert!(isa.has_extension("zknh"));
    }

    #[test]
    fn test_riscv_isa_without_extensions() {
        let isa = RiscvIsa::parse("rv64imafdc").unwrap();
        assert!(!isa.has_vector());
        assert!(!isa.has_aes());

        // Encryption alone is not enough, the AES decrypt half is required.
        let half = RiscvIsa::parse("rv64imafdc_zkne").unwrap();
        assert!(!half.has_aes());

        // Hash-only vector crypto does not imply AES.
        let sha = RiscvIsa::parse("rv64gc_zve64x_zvknha").unwrap();
        assert!(sha.has_vector());
        assert!(!sha.has_aes());

        let vector_aes = RiscvIsa::parse("RV64GCV_ZVKNED").unwrap();
        assert!(vector_aes.has_aes());
    }

    #[test]
    fn test_riscv_isa_rejects_foreign_strings() {
        assert!(RiscvIsa::parse("armv8").is_none());
        assert!(RiscvIsa::parse("").is_none());
    }

    #[test]
    fn test_vector_bit_follows_kernel_isa() {
        let scalar_only = RISCV_CPUINFO.replace("rv64imafdcv_", "rv64imafdc_");
        let isa = RiscvIsa::from_cpuinfo(&scalar_only).unwrap();
        assert!(!isa.has_vector());
        assert!(isa.has_aes());

        assert!(RiscvIsa::from_cpuinfo(RISCV_CPUINFO).unwrap().has_vector());
    }

    #[test]
    fn test_cpuinfo_without_isa_line() {
        let content = "processor\t: 0\nmodel name\t: Some CPU\n";
        assert!(matches!(RiscvIsa::from_cpuinfo(content), Err(SignalError::Parse(_))));
    }

    #[test]
    fn test_id_register_unread_off_freebsd() {
        let isar0 = HostSignals.id_aa64isar0();
        if !cfg!(all(target_arch = "aarch64", target_os = "freebsd")) {
            assert_eq!(isar0, None);
        }
    }

    #[test]
    fn test_can_read_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nr_hugepages");
        assert!(!HostSignals.can_read(&path));

        fs::write(&path, "0\n").unwrap();
        assert!(HostSignals.can_read(&path));
    }

    #[test]
    fn test_host_signals_never_panic() {
        let host = HostSignals;
        let _ = host.arm_name();
        let _ = host.riscv_name();
        let _ = host.riscv_crypto();
        let _ = host.riscv_vector();
        let _ = host.auxv(AT_HWCAP);
        let _ = host.id_aa64isar0();
    }
}
