use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Bytes read from one child stream.
pub(crate) struct Captured {
  pub bytes: Vec<u8>,
  /// The stream had more than `limit` bytes. `bytes` holds the first `limit`.
  pub overflowed: bool,
}

/// Read `reader` to EOF, stopping one byte past `limit`.
pub(crate) async fn read_bounded<R>(reader: R, limit: usize) -> io::Result<Captured>
where
  R: AsyncRead + Unpin,
{
  let mut bytes = Vec::new();
  let cap = (limit as u64).saturating_add(1);
  reader.take(cap).read_to_end(&mut bytes).await?;

  let overflowed = bytes.len() > limit;
  if overflowed {
    bytes.truncate(limit);
  }

  Ok(Captured { bytes, overflowed })
}
