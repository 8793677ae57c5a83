#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(all(target_os = "none", not(target_arch = "x86")))]
compile_error!("pickey is a 32-bit kernel; build it with --target i686-pickey.json");

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod image {
    use core::arch::global_asm;
    use core::panic::PanicInfo;

    use log::info;
    use pickey::{arch, logger, println, serial, serial_println};

    // Multiboot v1 header, boot stack and a flat GDT with the kernel code
    // segment at selector 0x08 and data at 0x10.
    global_asm!(
        r#"
        .section .multiboot, "a"
        .align 4
        .long 0x1BADB002
        .long 0x00000000
        .long -(0x1BADB002 + 0x00000000)

        .section .bss
        .align 16
        boot_stack_bottom:
        .skip 16384
        boot_stack_top:

        .section .rodata
        .align 8
        boot_gdt:
            .quad 0
            .quad 0x00CF9A000000FFFF
            .quad 0x00CF92000000FFFF
        boot_gdt_pointer:
            .word boot_gdt_pointer - boot_gdt - 1
            .long boot_gdt

        .section .text
        .global _start
        _start:
            cli
            mov esp, offset boot_stack_top
            lgdt [boot_gdt_pointer]
            push 0x08
            lea eax, [reload_segments]
            push eax
            retf
        reload_segments:
            mov ax, 0x10
            mov ds, ax
            mov es, ax
            mov fs, ax
            mov gs, ax
            mov ss, ax
            call kmain
        boot_halt:
            hlt
            jmp boot_halt
        "#
    );

    #[no_mangle]
    pub extern "C" fn kmain() -> ! {
        // === Phase 0: serial logging, optional ===
        if serial::init_serial().is_ok()
            && logger::init(serial::_print, logger::DEFAULT_LEVEL).is_ok()
        {
            info!("pickey booting");
        }

        // === Phase 1: banner, interrupt table, controllers, sti ===
        arch::boot();

        pickey::hlt_loop();
    }

    /// This function is called on panic.
    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        serial_println!("{}", info);
        println!("\n{}", info);
        pickey::hlt_loop();
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("pickey is a bare-metal kernel: cargo build --target i686-pickey.json -Zbuild-std=core,compiler_builtins -Zbuild-std-features=compiler-builtins-mem");
}
