mod case;
mod percent;
mod utf8;

pub use self::case::{eq_ignore_case, fold_case};
pub use self::percent::{PercentDecodeError, percent_decode, percent_encode};
pub use self::utf8::{Utf8Violation, check_utf8};
