use msq::{Conf, MsqErr, NumericField};
use std::{
    net::UdpSocket,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

const TOKEN: i32 = 9513307;

/// Minimal query server answering on a loopback socket.
struct FakeServer {
    port: u16,
    handshakes: Arc<AtomicUsize>,
}

impl FakeServer {
    /// Spawn a server that ignores the first `drop_stats` stat requests.
    fn spawn(drop_stats: usize) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = socket.local_addr().unwrap().port();
        let handshakes = Arc::new(AtomicUsize::new(0));
        let counter = handshakes.clone();

        thread::spawn(move || {
            let mut bufs = [0u8; 64];
            let mut dropped = 0;

            while let Ok((len, peer)) = socket.recv_from(&mut bufs) {
                let request = &bufs[..len];
                assert_eq!(&request[..2], &[0xFE, 0xFD]);
                let session_id = &request[3..7];

                let reply = match request[2] {
                    0x09 => {
                        counter.fetch_add(1, Ordering::SeqCst);
                        let token = format!("{}\x00", TOKEN);
                        [[0x09u8].as_slice(), session_id, token.as_bytes()].concat()
                    }
                    0x00 => {
                        assert_eq!(&request[7..11], TOKEN.to_be_bytes().as_slice());

                        if dropped < drop_stats {
                            dropped += 1;
                            continue;
                        }

                        let payload = match len {
                            11 => basic_payload().to_vec(),
                            _ => full_payload(),
                        };
                        [[0x00u8].as_slice(), session_id, payload.as_slice()].concat()
                    }
                    other => panic!("unexpected packet type {}", other),
                };

                if socket.send_to(&reply, peer).is_err() {
                    break;
                }
            }
        });

        Self { port, handshakes }
    }

    fn conf(&self) -> Conf {
        Conf::create_with_port("127.0.0.1", self.port)
            .with_timeout(Duration::from_millis(300))
            .with_session_id(1)
    }

    fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

fn basic_payload() -> &'static [u8] {
    b"&bA &lMinecraft Server\x00SMP\x00world\x003\x0020\x00\xDD\x63127.0.0.1\x00"
}

fn full_payload() -> Vec<u8> {
    [
        b"splitnum\x00\x80\x00".as_slice(),
        b"hostname\x00&bA &lMinecraft Server\x00gametype\x00SMP\x00game_id\x00MINECRAFT\x00",
        b"version\x001.20.1\x00plugins\x00Paper on Bukkit 1.20.1: LuckPerms; Vault\x00",
        b"map\x00world\x00numplayers\x003\x00maxplayers\x0020\x00hostport\x0025565\x00",
        b"hostip\x00127.0.0.1\x00\x00\x01player_\x00\x00",
        b"Notch\x00jeb_\x00Dinnerbone\x00\x00",
    ]
    .concat()
}

#[test]
fn basic_and_full_status_share_one_handshake() -> Result<(), MsqErr> {
    let server = FakeServer::spawn(0);
    let mut client = server.conf().create_client()?;

    let basic = client.query()?;
    assert_eq!(basic.motd, "&bA &lMinecraft Server");
    assert_eq!(basic.numplayers, 3);
    assert_eq!(basic.maxplayers, 20);
    assert_eq!(basic.hostport, 25565);
    assert_eq!(basic.hostname, "127.0.0.1");

    let full = client.query_full()?;
    assert_eq!(full.motd, "A Minecraft Server");
    assert_eq!(full.raw_motd, "&bA &lMinecraft Server");
    assert_eq!(full.software, "Paper on Bukkit 1.20.1");
    assert_eq!(full.plugins, vec!["LuckPerms", "Vault"]);
    assert_eq!(full.players, vec!["Notch", "jeb_", "Dinnerbone"]);
    assert_eq!(full.numplayers, Some(NumericField::Number(3)));
    assert_eq!(full.get("version"), Some("1.20.1"));

    assert_eq!(server.handshakes(), 1);
    assert_eq!(client.session().retries(), 0);

    Ok(())
}

#[test]
fn lost_stat_reply_renegotiates() -> Result<(), MsqErr> {
    let server = FakeServer::spawn(1);
    let mut client = server.conf().create_client()?;

    assert_eq!(client.query_full()?.players.len(), 3);
    assert_eq!(server.handshakes(), 2);
    assert_eq!(client.session().retries(), 1);

    Ok(())
}

#[test]
fn silent_server_fails_with_network_error() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let conf = Conf::create_with_port("127.0.0.1", silent.local_addr().unwrap().port())
        .with_timeout(Duration::from_millis(100));

    match conf.query() {
        Err(err) => {
            assert!(matches!(err, MsqErr::NetworkErr(_)));
            assert!(err.is_transient());
        }
        Ok(status) => panic!("unexpected status {}", status),
    }
}
