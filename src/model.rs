pub mod container;
mod float;
pub mod group;
pub mod header;
pub mod parameter;
pub mod trigger;

pub use self::container::Container;
pub use self::group::{ActionGroup, RecordGroup, RecordRange, ResourceGroup};
pub use self::header::{Flattened, GroupContents, Header};
pub use self::parameter::{CallbackTable, ParameterRecord};
pub use self::trigger::TriggerRecord;
