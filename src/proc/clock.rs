//! Clock-tick time base for sample timestamps and report time offsets.

use std::io;
use std::mem::MaybeUninit;
use std::sync::OnceLock;

static TICKS_PER_SECOND: OnceLock<u64> = OnceLock::new();

/// Kernel clock ticks per second (`sysconf(_SC_CLK_TCK)`, 100 on most Linux
/// configurations).
pub fn ticks_per_second() -> u64 {
    *TICKS_PER_SECOND.get_or_init(|| {
        // SAFETY: sysconf takes no pointers and cannot fail unsafely.
        let tps = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if tps > 0 { tps as u64 } else { 100 }
    })
}

/// Current tick count from `times(2)`. Monotonic for the life of the process.
pub fn ticks_now() -> io::Result<u64> {
    let mut tms = MaybeUninit::<libc::tms>::uninit();

    // SAFETY: times() only writes into the tms struct we hand it.
    let t = unsafe { libc::times(tms.as_mut_ptr()) };
    if t == -1 as libc::clock_t {
        Err(io::Error::last_os_error())
    } else {
        Ok(t as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_per_second_is_sane() {
        let tps = ticks_per_second();
        assert!(tps >= 1 && tps <= 1_000_000);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn ticks_do_not_go_backwards() {
        let a = ticks_now().unwrap();
        let b = ticks_now().unwrap();
        assert!(b >= a);
    }
}
