//! End-to-end scenarios against a real TCP loopback server (§8 scenarios
//! 1-4). Idle-eviction timing (scenario 5) is covered at the unit level in
//! `confer-core::state` with a virtual clock instead of a real 61-second
//! sleep.

use confer_proto::{Frame, MessageType};
use confer_server::{Server, system_env::SystemEnv};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

async fn spawn_server() -> std::net::SocketAddr {
    let server = Server::bind("127.0.0.1:0", SystemEnv::new()).await.expect("bind");
    let addr = server.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn send(stream: &mut TcpStream, frame: &Frame) {
    stream.write_all(&frame.encode()).await.expect("write frame");
}

async fn recv(stream: &mut TcpStream) -> Frame {
    let mut buf = [0u8; confer_proto::FRAME_SIZE];
    stream.read_exact(&mut buf).await.expect("read frame");
    Frame::decode(&buf).expect("decode frame")
}

fn login(id: &str, password: &str) -> Frame {
    let mut frame = Frame::new(MessageType::Login);
    frame.set_source(id);
    frame.set_data_str(password);
    frame
}

#[tokio::test]
async fn login_success() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).await.expect("connect");

    send(&mut stream, &login("alice", "12345")).await;
    let reply = recv(&mut stream).await;

    assert_eq!(reply.msg_type_enum().unwrap(), MessageType::LoAck);
    assert_eq!(reply.data_str(), "Login successful");
}

#[tokio::test]
async fn login_rejection_closes_connection() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).await.expect("connect");

    send(&mut stream, &login("alice", "wrong")).await;
    let reply = recv(&mut stream).await;

    assert_eq!(reply.msg_type_enum().unwrap(), MessageType::LoNak);
    assert_eq!(reply.data_str(), "Invalid username/password");

    let mut buf = [0u8; 1];
    let n = stream.read(&mut buf).await.expect("read after close");
    assert_eq!(n, 0, "server should have closed the connection");
}

#[tokio::test]
async fn duplicate_login_id_rejected() {
    let addr = spawn_server().await;
    let mut first = TcpStream::connect(addr).await.expect("connect");
    send(&mut first, &login("alice", "12345")).await;
    assert_eq!(recv(&mut first).await.msg_type_enum().unwrap(), MessageType::LoAck);

    let mut second = TcpStream::connect(addr).await.expect("connect");
    send(&mut second, &login("alice", "12345")).await;
    let reply = recv(&mut second).await;
    assert_eq!(reply.msg_type_enum().unwrap(), MessageType::LoNak);
    assert_eq!(reply.data_str(), "Client ID already in use");
}

#[tokio::test]
async fn session_create_and_broadcast_reaches_sender_and_members() {
    let addr = spawn_server().await;

    let mut alice = TcpStream::connect(addr).await.expect("connect");
    send(&mut alice, &login("alice", "12345")).await;
    recv(&mut alice).await;

    let mut bob = TcpStream::connect(addr).await.expect("connect");
    send(&mut bob, &login("bob", "hunter2")).await;
    recv(&mut bob).await;

    let mut new_sess = Frame::new(MessageType::NewSess);
    new_sess.set_data_str("room1");
    send(&mut alice, &new_sess).await;
    let ack = recv(&mut alice).await;
    assert_eq!(ack.msg_type_enum().unwrap(), MessageType::NsAck);

    let mut join = Frame::new(MessageType::Join);
    join.set_data_str("room1");
    send(&mut bob, &join).await;
    let ack = recv(&mut bob).await;
    assert_eq!(ack.msg_type_enum().unwrap(), MessageType::JnAck);

    let mut msg = Frame::new(MessageType::Message);
    msg.set_session("room1");
    msg.set_data_str("hi");
    send(&mut alice, &msg).await;

    let on_alice = recv(&mut alice).await;
    let on_bob = recv(&mut bob).await;

    assert_eq!(on_alice.msg_type_enum().unwrap(), MessageType::Message);
    assert_eq!(on_alice.source_str(), "alice");
    assert_eq!(on_alice.data_str(), "hi");
    assert_eq!(on_bob.source_str(), "alice");
    assert_eq!(on_bob.data_str(), "hi");
}

#[tokio::test]
async fn message_in_one_session_does_not_reach_another() {
    let addr = spawn_server().await;

    let mut alice = TcpStream::connect(addr).await.expect("connect");
    send(&mut alice, &login("alice", "12345")).await;
    recv(&mut alice).await;

    let mut r1 = Frame::new(MessageType::NewSess);
    r1.set_data_str("r1");
    send(&mut alice, &r1).await;
    recv(&mut alice).await;

    let mut r2 = Frame::new(MessageType::NewSess);
    r2.set_data_str("r2");
    send(&mut alice, &r2).await;
    recv(&mut alice).await;

    let mut msg = Frame::new(MessageType::Message);
    msg.set_session("r2");
    msg.set_data_str("only r2");
    send(&mut alice, &msg).await;

    let received = recv(&mut alice).await;
    assert_eq!(received.session_str(), "r2");
    assert_eq!(received.data_str(), "only r2");
}

#[tokio::test]
async fn join_twice_is_idempotent_end_to_end() {
    let addr = spawn_server().await;
    let mut alice = TcpStream::connect(addr).await.expect("connect");
    send(&mut alice, &login("alice", "12345")).await;
    recv(&mut alice).await;

    let mut new_sess = Frame::new(MessageType::NewSess);
    new_sess.set_data_str("room1");
    send(&mut alice, &new_sess).await;
    recv(&mut alice).await;

    let mut join = Frame::new(MessageType::Join);
    join.set_data_str("room1");
    send(&mut alice, &join).await;
    let first = recv(&mut alice).await;
    send(&mut alice, &join).await;
    let second = recv(&mut alice).await;

    assert_eq!(first.msg_type_enum().unwrap(), MessageType::JnAck);
    assert_eq!(second.msg_type_enum().unwrap(), MessageType::JnAck);
}

#[tokio::test]
async fn query_lists_users_and_sessions() {
    let addr = spawn_server().await;
    let mut alice = TcpStream::connect(addr).await.expect("connect");
    send(&mut alice, &login("alice", "12345")).await;
    recv(&mut alice).await;

    let mut new_sess = Frame::new(MessageType::NewSess);
    new_sess.set_data_str("room1");
    send(&mut alice, &new_sess).await;
    recv(&mut alice).await;

    send(&mut alice, &Frame::new(MessageType::Query)).await;
    let reply = recv(&mut alice).await;

    assert_eq!(reply.msg_type_enum().unwrap(), MessageType::QuAck);
    assert!(reply.data_str().contains("alice"));
    assert!(reply.data_str().contains("room1"));
}

#[tokio::test]
async fn exit_removes_from_session() {
    let addr = spawn_server().await;
    let mut alice = TcpStream::connect(addr).await.expect("connect");
    send(&mut alice, &login("alice", "12345")).await;
    recv(&mut alice).await;

    let mut new_sess = Frame::new(MessageType::NewSess);
    new_sess.set_data_str("room1");
    send(&mut alice, &new_sess).await;
    recv(&mut alice).await;

    send(&mut alice, &Frame::new(MessageType::Exit)).await;

    let mut buf = [0u8; 1];
    let n = alice.read(&mut buf).await.expect("read after exit");
    assert_eq!(n, 0);

    let mut bob = TcpStream::connect(addr).await.expect("connect");
    send(&mut bob, &login("bob", "hunter2")).await;
    recv(&mut bob).await;

    let mut join = Frame::new(MessageType::Join);
    join.set_data_str("room1");
    send(&mut bob, &join).await;
    let reply = recv(&mut bob).await;
    assert_eq!(reply.msg_type_enum().unwrap(), MessageType::JnNak);
}
