use conditional_dns_domain::ServerConfig;
use conditional_dns_infrastructure::dns::transport::{
    read_with_length_prefix, send_with_length_prefix,
};
use conditional_dns_infrastructure::dns::{DnsServerHandler, ServerTransport};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const UDP_RECV_BUFFER: usize = 4096;

/// Bind every listener the config asks for and serve until the returned
/// future is dropped.
pub async fn start_dns_server(
    config: &ServerConfig,
    handler: Arc<DnsServerHandler>,
) -> anyhow::Result<()> {
    let socket_addr: SocketAddr = config.listen_addr().parse()?;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let limiter = Arc::new(Semaphore::new(config.max_concurrent_queries.max(1)));
    let mut join_set: JoinSet<()> = JoinSet::new();

    if config.udp {
        let num_workers = config.udp_workers.max(1);
        info!(bind_address = %socket_addr, num_workers, "Starting UDP listeners with SO_REUSEPORT");

        for i in 0..num_workers {
            let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
            let handler_udp = Arc::clone(&handler);
            let limiter_udp = Arc::clone(&limiter);
            join_set.spawn(async move {
                run_udp_worker(udp_socket, handler_udp, limiter_udp, i).await;
            });
        }
    }

    if config.tcp {
        info!(bind_address = %socket_addr, "Starting TCP listener");
        let tcp_listener = create_tcp_listener(domain, socket_addr)?;
        let idle_timeout = Duration::from_secs(config.tcp_idle_timeout.max(1));
        let handler_tcp = Arc::clone(&handler);
        let limiter_tcp = Arc::clone(&limiter);
        join_set.spawn(async move {
            run_tcp_listener(tcp_listener, handler_tcp, limiter_tcp, idle_timeout).await;
        });
    }

    info!(
        udp = config.udp,
        tcp = config.tcp,
        max_concurrent_queries = config.max_concurrent_queries,
        "DNS server ready on {}",
        socket_addr
    );

    while join_set.join_next().await.is_some() {}
    Ok(())
}

async fn run_udp_worker(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    limiter: Arc<Semaphore>,
    worker_id: usize,
) {
    let mut recv_buf = [0u8; UDP_RECV_BUFFER];

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(worker = worker_id, error = %e, "UDP recv error");
                continue;
            }
        };

        let permit = match Arc::clone(&limiter).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(worker = worker_id, client = %from, "Query limit reached, dropping datagram");
                continue;
            }
        };

        let query = recv_buf[..n].to_vec();
        let handler = Arc::clone(&handler);
        let socket = Arc::clone(&socket);

        tokio::spawn(async move {
            let _permit = permit;
            if let Some(response) = handler.handle_raw(&query, from, ServerTransport::Udp).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    debug!(client = %from, error = %e, "UDP send failed");
                }
            }
        });
    }
}

async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    limiter: Arc<Semaphore>,
    idle_timeout: Duration,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let handler = Arc::clone(&handler);
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    serve_tcp_connection(stream, peer, handler, limiter, idle_timeout).await;
                });
            }
            Err(e) => {
                warn!(error = %e, "TCP accept failed");
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

/// Serve length-prefixed queries on one connection until the client goes
/// quiet for `idle_timeout` or closes it.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<DnsServerHandler>,
    limiter: Arc<Semaphore>,
    idle_timeout: Duration,
) {
    debug!(client = %peer, "TCP connection accepted");

    loop {
        let query = match tokio::time::timeout(idle_timeout, read_with_length_prefix(&mut stream))
            .await
        {
            Ok(Ok(query)) => query,
            Ok(Err(e)) => {
                debug!(client = %peer, error = %e, "TCP connection closed");
                break;
            }
            Err(_) => {
                debug!(client = %peer, "TCP connection idle, closing");
                break;
            }
        };

        let permit = match limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let response = handler.handle_raw(&query, peer, ServerTransport::Tcp).await;
        drop(permit);

        if let Some(response) = response {
            if let Err(e) = send_with_length_prefix(&mut stream, &response).await {
                debug!(client = %peer, error = %e, "TCP send failed");
                break;
            }
        }
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into()).map_err(|e| {
        error!(bind_address = %socket_addr, error = %e, "Failed to bind UDP socket");
        e
    })?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr.into()).map_err(|e| {
        error!(bind_address = %socket_addr, error = %e, "Failed to bind TCP socket");
        e
    })?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
