//! Fake project tree with a scripted simulator.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

use rvcheck::CheckConfig;
use tempfile::TempDir;

pub const NM: &str = "\
80000000 T _start
80000010 t L_LI_T0
80000018 t L_SW_GDATA0
8000001c t L_LI_T1
80000024 t L_SW_GDATA1
80000028 t L_LI_T2
80000030 t L_SW_GBUF
80000034 t L_SH_GBUF_P2
80000038 t L_SB_GBUF_P1
8000003c t L_LI_T3
8000003e t L_MISALIGNED_SW
80000042 t L_LI_T0_1
80000044 t L_SW_TOHOST
80001000 D tohost
80002000 D g_data0
80002004 D g_data1
80002008 D g_buf
";

pub const OBJDUMP: &str = "
skiptrap.elf:     file format elf32-littleriscv


Disassembly of section .text:

80000000 <_start>:
80000000:\t00002517          \tauipc\ta0,0x2
80000004:\t00050513          \tmv\ta0,a0

80000010 <L_LI_T0>:
80000010:\t123452b7          \tlui\tt0,0x12345
80000014:\t67828293          \taddi\tt0,t0,1656 # 12345678 <g_buf+0x92343670>

80000018 <L_SW_GDATA0>:
80000018:\t00552023          \tsw\tt0,0(a0)

8000001c <L_LI_T1>:
8000001c:\tabcdf337          \tlui\tt1,0xabcdf
80000020:\tf0130313          \taddi\tt1,t1,-255

80000024 <L_SW_GDATA1>:
80000024:\t00652223          \tsw\tt1,4(a0)

80000028 <L_LI_T2>:
80000028:\t112233b7          \tlui\tt2,0x11223
8000002c:\t34438393          \taddi\tt2,t2,836

80000030 <L_SW_GBUF>:
80000030:\t00752423          \tsw\tt2,8(a0)

80000034 <L_SH_GBUF_P2>:
80000034:\t00751523          \tsh\tt2,10(a0)

80000038 <L_SB_GBUF_P1>:
80000038:\t007504a3          \tsb\tt2,9(a0)

8000003c <L_LI_T3>:
8000003c:\t4e01                \tli\tt3,0

8000003e <L_MISALIGNED_SW>:
8000003e:\t00552123          \tsw\tt0,2(a0)

80000042 <L_LI_T0_1>:
80000042:\t4285                \tli\tt0,1

80000044 <L_SW_TOHOST>:
80000044:\t00532023          \tsw\tt0,0(t1)
";

/// Commit log of a conforming core. Stores are logged 4 bytes past their address.
pub const PASSING_LOG: &str = "\
[REG] pc=0x80000000 x10 <= 0x80002000
[REG] pc=0x80000010 x5 <= 0x12345000
[REG] pc=0x80000014 x5 <= 0x12345678
[MEMW] pc=0x8000001c addr=0x80002000 data=0x12345678 mask=0xf
[REG] pc=0x8000001c x6 <= 0xabcdf000
[REG] pc=0x80000020 x6 <= 0xabcdef01
[MEMW] pc=0x80000028 addr=0x80002004 data=0xabcdef01 mask=0xf
[REG] pc=0x80000028 x7 <= 0x11223000
[REG] pc=0x8000002c x7 <= 0x11223344
[MEMW] pc=0x80000034 addr=0x80002008 data=0x11223344 mask=0xf
[MEMW] pc=0x80000038 addr=0x80002008 data=0x33441122 mask=0xc
[MEMW] pc=0x8000003c addr=0x80002008 data=0x22334411 mask=0x2
[REG] pc=0x8000003c x28 <= 0x0
[TRAP] pc=0x8000003e exception=1 trap_jump=0 irq=0 cause=0x6
[REG] pc=0x80000042 x5 <= 0x1
[MEMW] pc=0x80000048 addr=0x80001000 data=0x1 mask=0xf
";

/// One trial at a time; exec of a script another fork holds open fails with ETXTBSY.
pub fn serial_guard() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A project root laid out the way the checker expects.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Create a project whose simulator writes `log` and exits with `exit_code`.
    pub fn new(log: &str, exit_code: i32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = Self { dir };

        let build = project.build_dir();
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("skiptrap.elf"), b"\x7fELF").unwrap();
        fs::write(build.join("skiptrap.nm"), NM).unwrap();
        fs::write(build.join("skiptrap.objdump"), OBJDUMP).unwrap();

        let fixture = project.root().join("commit_log.txt");
        fs::write(&fixture, log).unwrap();

        let runner = project.runner();
        fs::create_dir_all(runner.parent().unwrap()).unwrap();
        let script = format!(
            "#!/bin/sh\n\
             log=\"\"\n\
             while [ $# -gt 0 ]; do\n\
             \x20 case \"$1\" in\n\
             \x20   --log-file) log=\"$2\"; shift ;;\n\
             \x20 esac\n\
             \x20 shift\n\
             done\n\
             cat '{}' > \"$log\"\n\
             echo \"Done. Ticks: 812\"\n\
             exit {exit_code}\n",
            fixture.display()
        );
        fs::write(&runner, script).unwrap();
        fs::set_permissions(&runner, fs::Permissions::from_mode(0o755)).unwrap();

        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root().join("software").join("skiptrap").join("build")
    }

    pub fn runner(&self) -> PathBuf {
        self.root().join("build_result").join("kronos_rv32")
    }

    pub fn config(&self) -> CheckConfig {
        CheckConfig::from_root(self.root()).with_echo(false)
    }

    pub fn remove(&self, path: &Path) {
        fs::remove_file(path).unwrap();
    }
}
