// Entity Models
// "Identity persists, values change"
//
// Each entity has a stable identity (UUID) and values the user may edit.

pub mod category;

pub use category::{is_hex_color, Category, ParseKindError, TransactionKind, UserCategory};
