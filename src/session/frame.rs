// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Length-prefixed frames: a 4-byte big-endian length, then the body.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::{TransportError, TransportResult};

/// Read one frame body.
///
/// The announced length is checked against `max` before any allocation.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> TransportResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(TransportError::Closed),
        Err(e) => return Err(e.into()),
    };
    if len > max {
        return Err(TransportError::FrameTooLarge { size: len, max });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

pub async fn write_frame<W>(writer: &mut W, body: &[u8], max: usize) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    if body.len() > max || u32::try_from(body.len()).is_err() {
        return Err(TransportError::FrameTooLarge {
            size: body.len(),
            max,
        });
    }

    writer.write_u32(body.len() as u32).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}
