//! Frame codec for the paired teacher transport.
//!
//! Frames are a u32 little-endian length followed by the payload. Per tick
//! the teacher sends one reward frame (`"1"`, `"-1"`, or empty) and one
//! character frame; the agent replies with one character frame.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Teacher frames are tiny; anything longer is a protocol violation.
pub const MAX_FRAME_LEN: usize = 1024;

pub async fn read_frame<R: AsyncReadExt + Unpin>(r: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds the protocol maximum"),
        ));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_frame<W: AsyncWriteExt + Unpin>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    w.write_all(&(payload.len() as u32).to_le_bytes()).await?;
    w.write_all(payload).await?;
    w.flush().await
}

/// Map a reward frame to the learner's reward character.
pub fn parse_reward(frame: &[u8]) -> io::Result<char> {
    match frame {
        b"1" => Ok('+'),
        b"-1" => Ok('-'),
        b"" => Ok(' '),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("reward frame out of contract: {:?}", String::from_utf8_lossy(other)),
        )),
    }
}

/// A teacher frame carries exactly one character.
pub fn parse_teacher_char(frame: &[u8]) -> io::Result<char> {
    let s = std::str::from_utf8(frame)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "teacher frame is not UTF-8"))?;
    let mut it = s.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("teacher frame must be exactly one char, got {s:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(256);
        write_frame(&mut a, b"hello").await.unwrap();
        write_frame(&mut a, b"").await.unwrap();
        assert_eq!(read_frame(&mut b).await.unwrap(), b"hello");
        assert_eq!(read_frame(&mut b).await.unwrap(), b"");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let len = (MAX_FRAME_LEN as u32 + 1).to_le_bytes();
        tokio::io::AsyncWriteExt::write_all(&mut a, &len).await.unwrap();
        assert!(read_frame(&mut b).await.is_err());
    }

    #[test]
    fn reward_frames_map_to_contract_chars() {
        assert_eq!(parse_reward(b"1").unwrap(), '+');
        assert_eq!(parse_reward(b"-1").unwrap(), '-');
        assert_eq!(parse_reward(b"").unwrap(), ' ');
        assert!(parse_reward(b"2").is_err());
    }

    #[test]
    fn teacher_frame_must_be_one_char() {
        assert_eq!(parse_teacher_char(b"x").unwrap(), 'x');
        assert_eq!(parse_teacher_char(b" ").unwrap(), ' ');
        assert!(parse_teacher_char(b"").is_err());
        assert!(parse_teacher_char(b"ab").is_err());
    }
}
