//! The `base` crate defines the parts of the 36-bit machine which are
//! useful both to the instruction processor emulation and to other
//! associated tools.  The idea is that if you want to write an
//! assembler or a linker, it would depend on the base crate but would
//! not need to depend on the emulator library itself.

mod collections;
mod doubleword;
mod floating;
mod indexreg;
mod instruction;
mod word36;

pub mod prelude;

pub use crate::collections::pq::KeyedReversePriorityQueue;

#[macro_export]
macro_rules! w36 {
    ($n:expr) => {
        $crate::prelude::Word36::new::<{ $n }>()
    };
}

#[test]
fn test_w36() {
    use prelude::Word36;
    let m: Word36 = w36!(40_u64);
    let n: Word36 = Word36::from(40_u32);
    assert_eq!(m, n);

    let p: Word36 = w36!(1u64 << 34);
    let q: Word36 = Word36::try_from(1u64 << 34).expect("test data should be in range");
    assert_eq!(p, q);
}
