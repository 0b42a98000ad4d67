//! Keyboard-emulating scanner input
//!
//! Barcode and QR readers type the code followed by Enter, so each line of
//! input is one scan.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::machine::{KioskHandle, ScanReceipt};

/// Submit every non-blank line of `reader` as a scan until end of input
///
/// Bytes that are not UTF-8 are replaced rather than rejected, so a garbled
/// read becomes an unrecognized scan instead of ending the input.
pub async fn run_scanner<R>(mut reader: R, kiosk: KioskHandle) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut submitted = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        match kiosk.submit_scan(&line).await? {
            ScanReceipt::Processed(state) => {
                submitted += 1;
                tracing::debug!(state = state.name(), "Scan processed");
            }
            ScanReceipt::Dropped => tracing::debug!("Scan dropped, terminal busy"),
        }
    }

    tracing::info!(submitted, "Scanner input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::KioskConfig,
        kiosk::{
            collaborators::Collaborators,
            machine::spawn_kiosk,
            memory::MemoryLibrary,
            state::{OutcomeMessage, TerminalState},
        },
    };
    use std::sync::Arc;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_each_line_is_a_scan() {
        let library = Arc::new(MemoryLibrary::new());
        let member = library.add_member("M-1", "Ada", 3);
        library.add_item("B-1", "Dune");
        let kiosk = spawn_kiosk(
            Collaborators::new(library.clone(), library.clone(), library.clone()),
            &KioskConfig::default(),
        );

        let input: &[u8] = b"M-1\r\n\nM-1\r\nB-1\r\n";
        run_scanner(BufReader::new(input), kiosk.clone()).await.unwrap();

        match kiosk.current_state() {
            TerminalState::Outcome(outcome) => assert_eq!(outcome.message, OutcomeMessage::Borrowed),
            other => panic!("unexpected state {:?}", other),
        }
        assert_eq!(library.open_loans(member.id).len(), 1);
    }

    #[tokio::test]
    async fn test_code_split_across_reads() {
        let library = Arc::new(MemoryLibrary::new());
        let member = library.add_member("M-0001", "Ada", 3);
        let kiosk = spawn_kiosk(
            Collaborators::new(library.clone(), library.clone(), library.clone()),
            &KioskConfig::default(),
        );

        let reader = tokio_test::io::Builder::new()
            .read(b"M-00")
            .read(b"01\n")
            .build();
        run_scanner(BufReader::new(reader), kiosk.clone()).await.unwrap();

        match kiosk.current_state() {
            TerminalState::MemberIdentified(session) => assert_eq!(session.member, member),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbled_line_does_not_stop_input() {
        let library = Arc::new(MemoryLibrary::new());
        let member = library.add_member("M-1", "Ada", 3);
        let kiosk = spawn_kiosk(
            Collaborators::new(library.clone(), library.clone(), library.clone()),
            &KioskConfig::default(),
        );

        let garbled: &[u8] = b"\xff\xfe\n";
        run_scanner(BufReader::new(garbled), kiosk.clone()).await.unwrap();
        match kiosk.current_state() {
            TerminalState::Outcome(outcome) => {
                assert_eq!(outcome.message, OutcomeMessage::UnrecognizedCode)
            }
            other => panic!("unexpected state {:?}", other),
        }

        let input: &[u8] = b"\xff\xfe\nM-1\n";
        run_scanner(BufReader::new(input), kiosk.clone()).await.unwrap();
        match kiosk.current_state() {
            TerminalState::MemberIdentified(session) => assert_eq!(session.member, member),
            other => panic!("unexpected state {:?}", other),
        }
    }
}
