// SPDX-FileCopyrightText: 2023 Rivos Inc.
//
// SPDX-License-Identifier: Apache-2.0

/// Parks the calling hart forever. The hart never resumes execution; any further activity on the
/// system must come from another agent (another hart, or an external power controller).
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
pub fn hang() -> ! {
    loop {
        // Safety: WFI stalls the hart until the next interrupt and has no other effect.
        unsafe {
            core::arch::asm!("wfi", options(nomem, nostack));
        }
    }
}

/// Parks the calling hart forever.
#[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
pub fn hang() -> ! {
    panic!("hart halted");
}
