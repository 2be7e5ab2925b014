//! Reassembly state machine (FR) and the IO loop that drives it.
//!
//! `Receiver` is the sans-IO half: given one datagram it decides whether to
//! drop it, write a new fragment, or re-acknowledge a duplicate, without
//! touching a socket or a file itself. [`serve`] is the IO glue that owns
//! the socket and the output file and acts on each decision.

use std::path::Path;

use confer_proto::FragmentHeader;
use rand::Rng;
use tokio::{io::AsyncWriteExt, net::UdpSocket};

use crate::error::{ReceiverError, Result};

/// What the caller should do with one received datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Malformed header or simulated loss: drop silently, no ACK.
    Drop,
    /// A fragment to acknowledge. `is_new` is `false` for a duplicate
    /// retransmission, which must be re-ACKed without rewriting the file.
    Write { is_new: bool, payload: Vec<u8>, frag_no: u32, total_frag: u32, filename: String, done: bool },
}

/// Reassembly state: which transfer we've committed to (from fragment 1)
/// and how far we've acknowledged, per the `last_acked` cursor (§9).
#[derive(Debug, Default)]
pub struct Receiver {
    transfer: Option<(String, u32)>,
    last_acked: u32,
}

impl Receiver {
    /// Fresh receiver, no transfer established yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to do with one received datagram.
    ///
    /// # Errors
    ///
    /// [`ReceiverError::MismatchedHeader`] if a fragment after the first
    /// addresses a different `(filename, total_frag)` than fragment 1.
    pub fn handle_datagram(
        &mut self,
        datagram: &[u8],
        rng: &mut impl Rng,
        p_drop: f64,
    ) -> Result<Action> {
        let Ok((header, payload)) = FragmentHeader::parse(datagram) else {
            return Ok(Action::Drop);
        };

        if let Some((filename, total_frag)) = &self.transfer {
            if *filename != header.filename || *total_frag != header.total_frag {
                return Err(ReceiverError::MismatchedHeader { frag_no: header.frag_no });
            }
        }

        if rng.gen_bool(p_drop) {
            return Ok(Action::Drop);
        }

        if self.transfer.is_none() {
            self.transfer = Some((header.filename.clone(), header.total_frag));
        }

        let is_new = header.frag_no > self.last_acked;
        if is_new {
            self.last_acked = header.frag_no;
        }

        Ok(Action::Write {
            is_new,
            payload: payload.to_vec(),
            frag_no: header.frag_no,
            total_frag: header.total_frag,
            filename: header.filename,
            done: header.frag_no == header.total_frag,
        })
    }
}

/// Run the handshake and reassembly loop to completion on `socket`,
/// writing the received file under `out_dir`. A mismatched-header error
/// mid-transfer removes whatever partial file had been written so far.
///
/// # Errors
///
/// Returns [`ReceiverError::BadHandshake`] if the first datagram isn't
/// `"ftp"`, [`ReceiverError::Fatal`] if `out_dir` doesn't exist, and
/// [`ReceiverError::MismatchedHeader`] per [`Receiver::handle_datagram`].
pub async fn serve(socket: &UdpSocket, out_dir: &Path, p_drop: f64, rng: &mut impl Rng) -> Result<()> {
    let mut hs_buf = [0u8; confer_proto::MAX_DATAGRAM];
    let (n, peer) =
        socket.recv_from(&mut hs_buf).await.map_err(|e| ReceiverError::Transport(e.to_string()))?;
    if &hs_buf[..n] != b"ftp" {
        return Err(ReceiverError::BadHandshake(hs_buf[..n].to_vec()));
    }
    socket.send_to(b"yes", peer).await.map_err(|e| ReceiverError::Transport(e.to_string()))?;

    let mut receiver = Receiver::new();
    let mut file: Option<(tokio::fs::File, std::path::PathBuf)> = None;

    loop {
        let mut buf = vec![0u8; confer_proto::MAX_DATAGRAM];
        let (n, from) =
            socket.recv_from(&mut buf).await.map_err(|e| ReceiverError::Transport(e.to_string()))?;
        if from != peer {
            continue;
        }
        buf.truncate(n);

        let action = match receiver.handle_datagram(&buf, rng, p_drop) {
            Ok(action) => action,
            Err(error) => {
                if let Some((f, path)) = file.take() {
                    drop(f);
                    let _ = tokio::fs::remove_file(&path).await;
                }
                return Err(error);
            },
        };

        match action {
            Action::Drop => continue,
            Action::Write { is_new, payload, frag_no, filename, done, .. } => {
                if is_new {
                    if frag_no == 1 {
                        let path = out_dir.join(&filename);
                        let handle = tokio::fs::File::create(&path)
                            .await
                            .map_err(|e| ReceiverError::Fatal(e.to_string()))?;
                        tracing::info!(%filename, path = %path.display(), "opened output file");
                        file = Some((handle, path));
                    }
                    if let Some((f, _)) = &mut file {
                        f.write_all(&payload).await.map_err(|e| ReceiverError::Fatal(e.to_string()))?;
                    }
                }

                socket.send_to(b"ACK", peer).await.map_err(|e| ReceiverError::Transport(e.to_string()))?;
                tracing::debug!(frag_no, is_new, "fragment acknowledged");

                if done {
                    if let Some((mut f, _)) = file.take() {
                        f.flush().await.map_err(|e| ReceiverError::Fatal(e.to_string()))?;
                    }
                    return Ok(());
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn no_drop_rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    fn datagram(total: u32, no: u32, payload: &[u8], name: &str) -> Vec<u8> {
        FragmentHeader { total_frag: total, frag_no: no, data_size: payload.len() as u32, filename: name.to_owned() }
            .build_datagram(payload)
            .unwrap()
    }

    #[test]
    fn first_fragment_opens_new_transfer() {
        let mut receiver = Receiver::new();
        let mut rng = no_drop_rng();
        let action = receiver.handle_datagram(&datagram(2, 1, b"abc", "x.bin"), &mut rng, 0.0).unwrap();
        assert_eq!(
            action,
            Action::Write {
                is_new: true,
                payload: b"abc".to_vec(),
                frag_no: 1,
                total_frag: 2,
                filename: "x.bin".to_owned(),
                done: false,
            }
        );
    }

    #[test]
    fn duplicate_fragment_is_not_rewritten() {
        let mut receiver = Receiver::new();
        let mut rng = no_drop_rng();
        receiver.handle_datagram(&datagram(2, 1, b"abc", "x.bin"), &mut rng, 0.0).unwrap();

        let action = receiver.handle_datagram(&datagram(2, 1, b"abc", "x.bin"), &mut rng, 0.0).unwrap();
        assert_eq!(
            action,
            Action::Write {
                is_new: false,
                payload: b"abc".to_vec(),
                frag_no: 1,
                total_frag: 2,
                filename: "x.bin".to_owned(),
                done: false,
            }
        );
    }

    #[test]
    fn last_fragment_marks_done() {
        let mut receiver = Receiver::new();
        let mut rng = no_drop_rng();
        receiver.handle_datagram(&datagram(2, 1, b"abc", "x.bin"), &mut rng, 0.0).unwrap();
        let action = receiver.handle_datagram(&datagram(2, 2, b"de", "x.bin"), &mut rng, 0.0).unwrap();
        assert!(matches!(action, Action::Write { done: true, .. }));
    }

    #[test]
    fn malformed_header_is_dropped() {
        let mut receiver = Receiver::new();
        let mut rng = no_drop_rng();
        let action = receiver.handle_datagram(b"not a header", &mut rng, 0.0).unwrap();
        assert_eq!(action, Action::Drop);
    }

    #[test]
    fn forced_drop_probability_drops_valid_fragment() {
        let mut receiver = Receiver::new();
        let mut rng = no_drop_rng();
        let action = receiver.handle_datagram(&datagram(1, 1, b"a", "x.bin"), &mut rng, 1.0).unwrap();
        assert_eq!(action, Action::Drop);
    }

    #[test]
    fn mismatched_filename_mid_transfer_is_fatal() {
        let mut receiver = Receiver::new();
        let mut rng = no_drop_rng();
        receiver.handle_datagram(&datagram(2, 1, b"abc", "x.bin"), &mut rng, 0.0).unwrap();
        let err = receiver.handle_datagram(&datagram(2, 2, b"de", "y.bin"), &mut rng, 0.0).unwrap_err();
        assert!(matches!(err, ReceiverError::MismatchedHeader { frag_no: 2 }));
    }
}
