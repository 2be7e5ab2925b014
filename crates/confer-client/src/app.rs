//! REPL command grammar and session bookkeeping.
//!
//! [`Command::parse`] turns one line of user input into a [`Command`];
//! [`Session::apply`] turns a `Command` into a frame sent over the
//! connection and updates the small amount of local state the client needs
//! to know which session bare text goes to.

use confer_proto::{Frame, MessageType};

use crate::{
    error::{ClientError, Result},
    transport::Connection,
};

/// One parsed REPL command.
pub enum Command {
    /// `/login <id> <pw> <ip> <port>`
    Login { id: String, password: String, addr: std::net::SocketAddr },
    /// `/logout`
    Logout,
    /// `/joinsession <sid>`
    JoinSession { sid: String },
    /// `/leavesession`
    LeaveSession,
    /// `/createsession <sid>`
    CreateSession { sid: String },
    /// `/switchsession <sid>`
    SwitchSession { sid: String },
    /// `/list`
    List,
    /// `/quit`
    Quit,
    /// Bare text, sent to the active session.
    Text(String),
}

impl Command {
    /// Parse one line of REPL input.
    ///
    /// # Errors
    ///
    /// [`ClientError::BadCommand`] if the line starts with `/` but isn't a
    /// recognized command, or is missing arguments.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return Ok(Self::Text(line.to_owned()));
        }

        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        match cmd {
            "/login" => {
                let [id, password, ip, port] = <[&str; 4]>::try_from(rest.as_slice())
                    .map_err(|_| ClientError::BadCommand("usage: /login <id> <pw> <ip> <port>".to_owned()))?;
                let addr = format!("{ip}:{port}")
                    .parse()
                    .map_err(|_| ClientError::BadCommand(format!("bad address {ip}:{port}")))?;
                Ok(Self::Login { id: id.to_owned(), password: password.to_owned(), addr })
            },
            "/logout" => Ok(Self::Logout),
            "/joinsession" => {
                let [sid] = <[&str; 1]>::try_from(rest.as_slice())
                    .map_err(|_| ClientError::BadCommand("usage: /joinsession <sid>".to_owned()))?;
                Ok(Self::JoinSession { sid: sid.to_owned() })
            },
            "/leavesession" => Ok(Self::LeaveSession),
            "/createsession" => {
                let [sid] = <[&str; 1]>::try_from(rest.as_slice())
                    .map_err(|_| ClientError::BadCommand("usage: /createsession <sid>".to_owned()))?;
                Ok(Self::CreateSession { sid: sid.to_owned() })
            },
            "/switchsession" => {
                let [sid] = <[&str; 1]>::try_from(rest.as_slice())
                    .map_err(|_| ClientError::BadCommand("usage: /switchsession <sid>".to_owned()))?;
                Ok(Self::SwitchSession { sid: sid.to_owned() })
            },
            "/list" => Ok(Self::List),
            "/quit" => Ok(Self::Quit),
            other => Err(ClientError::BadCommand(format!("unknown command {other}"))),
        }
    }
}

/// A logged-in REPL session: the transport connection plus the subset of
/// client-record state (§3) this process needs locally — which sessions
/// we've joined, and which one bare text currently targets. `joined`/
/// `active` only ever reflect what the server has confirmed: a JOIN or
/// NEW_SESS request parks its session id in `pending` until the matching
/// `JN_ACK`/`NS_ACK`/`JN_NAK` reply arrives on the inbound frame path (see
/// [`Session::confirm_pending`]/[`Session::clear_pending`], driven from
/// `main`'s frame handler).
pub struct Session {
    /// The underlying connection; `main` selects on `connection.inbound`.
    pub connection: Connection,
    /// Our own principal ID, for display.
    pub id: String,
    joined: Vec<String>,
    active: Option<String>,
    pending: Option<String>,
}

impl Session {
    /// Wrap a freshly logged-in connection.
    #[must_use]
    pub fn new(connection: Connection, id: String) -> Self {
        Self { connection, id, joined: Vec::new(), active: None, pending: None }
    }

    /// The session bare text currently targets, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Sessions this client has joined (locally tracked, §3's joined list).
    #[must_use]
    pub fn joined_sessions(&self) -> &[String] {
        &self.joined
    }

    /// A JOIN/NEW_SESS for `sid` was confirmed: commit it to `joined` and
    /// make it the active session. No-op if `sid` doesn't match whatever was
    /// pending (e.g. a stale or unexpected reply).
    pub fn confirm_pending(&mut self, sid: &str) {
        if self.pending.as_deref() != Some(sid) {
            return;
        }
        self.pending = None;
        if !self.joined.contains(&sid.to_owned()) {
            self.joined.push(sid.to_owned());
        }
        self.active = Some(sid.to_owned());
    }

    /// A JOIN/NEW_SESS was rejected: drop whatever was pending without
    /// touching `joined`/`active`.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Apply a command: send whatever frame it implies and update local
    /// state. Returns `false` when the REPL should exit.
    pub fn apply(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Login { .. } => Err(ClientError::AlreadyLoggedIn),

            Command::Logout | Command::Quit => {
                let _ = self.connection.send(Frame::new(MessageType::Exit));
                Ok(false)
            },

            Command::JoinSession { sid } => {
                let mut frame = Frame::new(MessageType::Join);
                frame.set_data_str(&sid);
                self.connection.send(frame)?;
                self.pending = Some(sid);
                Ok(true)
            },

            Command::CreateSession { sid } => {
                let mut frame = Frame::new(MessageType::NewSess);
                frame.set_data_str(&sid);
                self.connection.send(frame)?;
                self.pending = Some(sid);
                Ok(true)
            },

            Command::LeaveSession => {
                let Some(sid) = self.active.take() else {
                    return Err(ClientError::NoActiveSession);
                };
                let mut frame = Frame::new(MessageType::LeaveSess);
                frame.set_session(&sid);
                self.connection.send(frame)?;
                self.joined.retain(|s| s != &sid);
                Ok(true)
            },

            Command::SwitchSession { sid } => {
                if !self.joined.contains(&sid) {
                    return Err(ClientError::BadCommand(format!("not a member of {sid}")));
                }
                self.active = Some(sid);
                Ok(true)
            },

            Command::List => {
                self.connection.send(Frame::new(MessageType::Query))?;
                Ok(true)
            },

            Command::Text(text) => {
                let Some(sid) = self.active.clone() else {
                    return Err(ClientError::NoActiveSession);
                };
                let mut frame = Frame::new(MessageType::Message);
                frame.set_session(&sid);
                frame.set_data_str(&text);
                self.connection.send(frame)?;
                Ok(true)
            },
        }
    }
}
