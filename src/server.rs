use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument};

use crate::codec::CodecError;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

pub async fn run(port: u16) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let store = Store::new();

    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let store = store.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store).await {
                error!("Connection error: {}", e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    loop {
        let frame = match conn.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            // Malformed frame: the codec already discarded the poisoned read
            // buffer, so report the error and keep serving the connection.
            Err(CodecError::Protocol(msg)) => {
                debug!("Protocol error: {}", msg);
                conn.write_frame(Frame::Error(format!("ERR protocol error: {msg}")))
                    .await?;
                continue;
            }
            Err(CodecError::Io(e)) => return Err(e.into()),
        };

        debug!("Received frame from client: {:?}", frame);

        // Parse and execution errors become error replies; the connection
        // itself stays healthy.
        let reply = match Command::try_from(frame) {
            Ok(cmd) => cmd
                .exec(store.clone())
                .await
                .unwrap_or_else(|e| e.to_frame()),
            Err(e) => e.to_frame(),
        };

        debug!("Sending response to client: {:?}", reply);
        conn.write_frame(reply).await?;
    }

    info!("Connection closed");
    Ok(())
}
