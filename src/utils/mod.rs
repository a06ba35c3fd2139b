pub(crate) mod hexdump;
mod read_ext;
mod seek_guard;
mod write_ext;

pub(crate) use self::read_ext::ReadExt;
pub use self::seek_guard::SeekGuard;
pub(crate) use self::write_ext::WriteExt;
