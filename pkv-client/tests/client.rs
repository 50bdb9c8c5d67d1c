use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use pkv_client::{ClientConfig, Expiry, KVClient, StoreError};
use pkv_common::Store;
use pkv_engine::MemoryStore;

/// Serves one connection, answering each command with `handler`.
fn spawn_scripted(expected: usize, handler: fn(usize, Vec<Vec<u8>>, &mut TcpStream)) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        for idx in 0..expected {
            let args = read_command(&mut reader).expect("read command").expect("command");
            handler(idx, args, &mut stream);
        }
    });

    addr
}

/// Serves one connection from a `MemoryStore` until the client hangs up.
fn spawn_store_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();

    thread::spawn(move || {
        let store = MemoryStore::new();
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        while let Ok(Some(args)) = read_command(&mut reader) {
            let reply = dispatch(&store, &args);
            if stream.write_all(&reply).is_err() {
                break;
            }
        }
    });

    addr
}

fn dispatch(store: &MemoryStore, args: &[Vec<u8>]) -> Vec<u8> {
    let cmd = args[0].to_ascii_uppercase();
    let result = match (cmd.as_slice(), args.len()) {
        (b"PING", 1) => return b"+PONG\r\n".to_vec(),
        (b"GET", 2) => store.get(&args[1]).map(bulk),
        (b"SET", 3) => store.set(&args[1], &args[2], Expiry::Never).map(|_| ok()),
        (b"SET", 5) => {
            let millis: u64 = std::str::from_utf8(&args[4]).unwrap().parse().unwrap();
            let ttl = Expiry::After(Duration::from_millis(millis));
            store.set(&args[1], &args[2], ttl).map(|_| ok())
        }
        (b"HSET", 4) => store
            .hset(&args[1], &args[2], &args[3])
            .map(|added| integer(added as i64)),
        (b"HGET", 3) => store.hget(&args[1], &args[2]).map(bulk),
        (b"DEL", n) if n > 1 => {
            let keys: Vec<&[u8]> = args[1..].iter().map(Vec::as_slice).collect();
            store.del(&keys).map(|removed| integer(removed as i64))
        }
        _ => return b"-ERR unknown command\r\n".to_vec(),
    };
    result.unwrap_or_else(|err| format!("-{err}\r\n").into_bytes())
}

fn ok() -> Vec<u8> {
    b"+OK\r\n".to_vec()
}

fn integer(value: i64) -> Vec<u8> {
    format!(":{value}\r\n").into_bytes()
}

fn bulk(data: Option<Vec<u8>>) -> Vec<u8> {
    match data {
        None => b"$-1\r\n".to_vec(),
        Some(data) => {
            let mut out = format!("${}\r\n", data.len()).into_bytes();
            out.extend_from_slice(&data);
            out.extend_from_slice(b"\r\n");
            out
        }
    }
}

fn read_command(reader: &mut BufReader<TcpStream>) -> std::io::Result<Option<Vec<Vec<u8>>>> {
    let Some(header) = read_line(reader)? else {
        return Ok(None);
    };
    let count = parse_len(&header, b'*')?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let line = read_line(reader)?.ok_or_else(|| invalid("eof inside command"))?;
        let len = parse_len(&line, b'$')?;
        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data)?;
        data.truncate(len);
        args.push(data);
    }
    Ok(Some(args))
}

fn read_line(reader: &mut BufReader<TcpStream>) -> std::io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if !buf.ends_with(b"\r\n") {
        return Err(invalid("invalid line"));
    }
    buf.truncate(buf.len() - 2);
    Ok(Some(buf))
}

fn parse_len(line: &[u8], marker: u8) -> std::io::Result<usize> {
    if line.first() != Some(&marker) {
        return Err(invalid("unexpected marker"));
    }
    std::str::from_utf8(&line[1..])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| invalid("bad length"))
}

fn invalid(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string())
}

fn client_with_addr(addr: String) -> KVClient {
    KVClient::with_config(ClientConfig {
        addr,
        max_idle: 1,
        max_total: 1,
        read_timeout: Some(Duration::from_secs(2)),
        write_timeout: Some(Duration::from_secs(2)),
        connect_timeout: Some(Duration::from_secs(2)),
    })
}

#[test]
fn client_sends_expected_frames() {
    let addr = spawn_scripted(3, |idx, args, stream| match idx {
        0 => {
            assert_eq!(args, vec![b"PING".to_vec()]);
            stream.write_all(b"+PONG\r\n").unwrap();
        }
        1 => {
            assert_eq!(args[0], b"SET");
            assert_eq!(args[3], b"PX");
            assert_eq!(args[4], b"1500");
            stream.write_all(b"+OK\r\n").unwrap();
        }
        _ => {
            assert_eq!(args, vec![b"DEL".to_vec(), b"a".to_vec(), b"b".to_vec()]);
            stream.write_all(b":1\r\n").unwrap();
        }
    });

    let client = client_with_addr(addr);
    client.ping().expect("ping");
    client
        .set(b"k", b"v", Expiry::After(Duration::from_millis(1500)))
        .expect("set");
    assert_eq!(client.del(&[b"a", b"b"]).expect("del"), 1);
}

#[test]
fn error_reply_surfaces_as_server_error() {
    let addr = spawn_scripted(1, |_, _, stream| {
        stream.write_all(b"-ERR boom\r\n").unwrap();
    });

    let client = client_with_addr(addr);
    let err = client.get(b"key").unwrap_err();
    assert!(matches!(err, StoreError::Server { message } if message == b"ERR boom"));
}

#[test]
fn unexpected_reply_type_is_rejected() {
    let addr = spawn_scripted(1, |_, _, stream| {
        stream.write_all(b":7\r\n").unwrap();
    });

    let client = client_with_addr(addr);
    assert!(matches!(client.get(b"key"), Err(StoreError::UnexpectedResponse)));
}

#[test]
fn get_of_missing_key_is_none() {
    let addr = spawn_store_server();
    let client = client_with_addr(addr.clone());
    assert_eq!(client.addr(), addr);
    assert_eq!(client.get(b"dont_exists").expect("get"), None);
}

#[test]
fn scalar_roundtrip_and_bulk_delete() {
    let client = client_with_addr(spawn_store_server());
    let keys: Vec<String> = (0..50).map(|idx| format!("key-{idx}")).collect();
    for key in &keys {
        client.set(key.as_bytes(), key.as_bytes(), Expiry::Never).expect("set");
    }
    for key in &keys {
        assert_eq!(client.get(key.as_bytes()).expect("get"), Some(key.clone().into_bytes()));
    }

    let refs: Vec<&[u8]> = keys.iter().map(String::as_bytes).collect();
    assert_eq!(client.del(&refs).expect("del"), 50);
    for key in &keys {
        assert_eq!(client.get(key.as_bytes()).expect("get"), None);
    }
}

#[test]
fn hash_roundtrip_and_delete() {
    let client = client_with_addr(spawn_store_server());
    assert!(client.hset(b"key", b"field", b"field").expect("hset"));
    assert_eq!(client.hget(b"key", b"field").expect("hget"), Some(b"field".to_vec()));
    assert_eq!(client.del(&[b"key"]).expect("del"), 1);
    assert_eq!(client.hget(b"key", b"field").expect("hget"), None);
}

#[test]
fn close_releases_connection_and_blocks_further_calls() {
    let client = client_with_addr(spawn_store_server());
    client.ping().expect("ping");
    client.close().expect("close");
    assert!(matches!(client.ping(), Err(StoreError::Closed)));
}

#[test]
fn unreachable_server_is_an_io_error() {
    // Bind then drop to get a port with nothing listening.
    let addr = TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("addr")
        .to_string();
    let client = client_with_addr(addr);
    assert!(matches!(client.ping(), Err(StoreError::Io(_))));
}
