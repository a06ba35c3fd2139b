use std::io::{self, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

/// A temporary relocation of a stream.
///
/// The guard seeks to the requested offset on creation, and seeks back to where the stream was
/// when it is dropped. That includes leaving the scope early through `?` or a panic, so code that
/// jumps to a string table or a header body never leaves the cursor behind.
///
/// The guard dereferences to the underlying stream, so it can be passed wherever `&mut S` is
/// expected.
pub struct SeekGuard<'a, S: Seek> {
    stream: &'a mut S,
    restore_to: u64,
}

impl<'a, S: Seek> SeekGuard<'a, S> {
    pub fn new(stream: &'a mut S, offset: u64) -> io::Result<Self> {
        let restore_to = stream.stream_position()?;
        stream.seek(SeekFrom::Start(offset))?;

        Ok(SeekGuard { stream, restore_to })
    }

    /// Position the stream will be restored to.
    pub fn restore_position(&self) -> u64 {
        self.restore_to
    }
}

impl<S: Seek> Deref for SeekGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.stream
    }
}

impl<S: Seek> DerefMut for SeekGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.stream
    }
}

impl<S: Seek> Drop for SeekGuard<'_, S> {
    fn drop(&mut self) {
        // Errors cannot be reported from drop.
        let _ = self.stream.seek(SeekFrom::Start(self.restore_to));
    }
}
