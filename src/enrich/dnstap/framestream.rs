//! A minimal reader for Farsight's Frame Streaming protocol, the transport
//! `dnstap` payloads arrive over. Handles the bidirectional handshake
//! (READY/ACCEPT/START) and yields each data frame's raw bytes; STOP ends
//! the stream cleanly.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CONTROL_ACCEPT: u32 = 0x01;
const CONTROL_START: u32 = 0x02;
const CONTROL_STOP: u32 = 0x03;
const CONTROL_READY: u32 = 0x04;
const CONTROL_FINISH: u32 = 0x05;
const FIELD_CONTENT_TYPE: u32 = 0x01;

const CONTENT_TYPE: &[u8] = b"protobuf:dnstap.Dnstap";

pub struct FrameStreamReader<S> {
    stream: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FrameStreamReader<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    async fn read_u32(&mut self) -> std::io::Result<u32> {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf).await?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads one control frame, assuming the leading 0-length escape has
    /// already been consumed by the caller.
    async fn read_control_frame(&mut self) -> std::io::Result<(u32, Vec<u8>)> {
        let frame_len = self.read_u32().await?;
        if frame_len < 4 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "control frame shorter than its 4-byte type field",
            ));
        }
        let mut body = vec![0u8; frame_len as usize];
        self.stream.read_exact(&mut body).await?;
        let control_type = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
        Ok((control_type, body[4..].to_vec()))
    }

    /// Reads the 0-length escape that precedes every control frame, then
    /// the control frame itself.
    async fn read_escaped_control_frame(&mut self) -> std::io::Result<(u32, Vec<u8>)> {
        let escape = self.read_u32().await?;
        if escape != 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "expected a 0-length escape"));
        }
        self.read_control_frame().await
    }

    async fn write_control_frame(&mut self, control_type: u32, fields: &[(u32, &[u8])]) -> std::io::Result<()> {
        let mut body = Vec::new();
        body.extend_from_slice(&control_type.to_be_bytes());
        for (field_type, content) in fields {
            body.extend_from_slice(&field_type.to_be_bytes());
            body.extend_from_slice(&(content.len() as u32).to_be_bytes());
            body.extend_from_slice(content);
        }
        self.stream.write_all(&0u32.to_be_bytes()).await?;
        self.stream.write_all(&(body.len() as u32).to_be_bytes()).await?;
        self.stream.write_all(&body).await?;
        self.stream.flush().await
    }

    /// Performs the bidirectional READY/ACCEPT/START handshake. Returns
    /// `Ok(())` once the client has sent START and the connection is ready
    /// to yield data frames.
    pub async fn handshake(&mut self) -> std::io::Result<()> {
        let (control_type, _fields) = self.read_escaped_control_frame().await?;
        if control_type != CONTROL_READY {
            return Err(std::io::Error::other("expected READY control frame"));
        }
        self.write_control_frame(CONTROL_ACCEPT, &[(FIELD_CONTENT_TYPE, CONTENT_TYPE)]).await?;

        let (control_type, _fields) = self.read_escaped_control_frame().await?;
        if control_type != CONTROL_START {
            return Err(std::io::Error::other("expected START control frame"));
        }
        Ok(())
    }

    /// Returns the next data frame, `None` on a clean STOP/EOF.
    pub async fn next_frame(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        loop {
            let len = match self.read_u32().await {
                Ok(len) => len,
                Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(err) => return Err(err),
            };

            if len == 0 {
                let (control_type, _fields) = self.read_control_frame().await?;
                if control_type == CONTROL_STOP {
                    let _ = self.write_control_frame(CONTROL_FINISH, &[]).await;
                    return Ok(None);
                }
                continue;
            }

            let mut frame = vec![0u8; len as usize];
            self.stream.read_exact(&mut frame).await?;
            return Ok(Some(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn handshake_then_one_data_frame_then_stop() {
        let (client, server) = duplex(4096);
        let mut reader = FrameStreamReader::new(server);

        let handshake = tokio::spawn(async move {
            let mut client = client;
            // READY
            client.write_all(&0u32.to_be_bytes()).await.unwrap();
            let mut ready_body = CONTROL_READY.to_be_bytes().to_vec();
            ready_body.extend_from_slice(&FIELD_CONTENT_TYPE.to_be_bytes());
            ready_body.extend_from_slice(&(CONTENT_TYPE.len() as u32).to_be_bytes());
            ready_body.extend_from_slice(CONTENT_TYPE);
            client.write_all(&(ready_body.len() as u32).to_be_bytes()).await.unwrap();
            client.write_all(&ready_body).await.unwrap();

            // read ACCEPT (don't validate contents here, just drain)
            let mut len_buf = [0u8; 4];
            client.read_exact(&mut len_buf).await.unwrap();
            let mut frame_len_buf = [0u8; 4];
            client.read_exact(&mut frame_len_buf).await.unwrap();
            let frame_len = u32::from_be_bytes(frame_len_buf);
            let mut discard = vec![0u8; frame_len as usize];
            client.read_exact(&mut discard).await.unwrap();

            // START
            client.write_all(&0u32.to_be_bytes()).await.unwrap();
            let start_body = CONTROL_START.to_be_bytes();
            client.write_all(&(start_body.len() as u32).to_be_bytes()).await.unwrap();
            client.write_all(&start_body).await.unwrap();

            // one data frame
            let payload = b"hello".to_vec();
            client.write_all(&(payload.len() as u32).to_be_bytes()).await.unwrap();
            client.write_all(&payload).await.unwrap();

            // STOP
            client.write_all(&0u32.to_be_bytes()).await.unwrap();
            let stop_body = CONTROL_STOP.to_be_bytes();
            client.write_all(&(stop_body.len() as u32).to_be_bytes()).await.unwrap();
            client.write_all(&stop_body).await.unwrap();
        });

        reader.handshake().await.unwrap();
        let frame = reader.next_frame().await.unwrap();
        assert_eq!(frame, Some(b"hello".to_vec()));
        let end = reader.next_frame().await.unwrap();
        assert_eq!(end, None);

        handshake.await.unwrap();
    }

    #[tokio::test]
    async fn short_control_frame_errors_instead_of_panicking() {
        let (mut client, server) = duplex(4096);
        let mut reader = FrameStreamReader::new(server);

        client.write_all(&0u32.to_be_bytes()).await.unwrap();
        client.write_all(&3u32.to_be_bytes()).await.unwrap();
        client.write_all(&[0u8, 0, 0]).await.unwrap();

        let result = reader.handshake().await;
        assert!(result.is_err());
    }
}
