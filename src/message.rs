use colored::Colorize;
use std::net::SocketAddr;
use std::path::Path;

use crate::handlers::HandlerRegistry;
use crate::router::RouteTable;

pub struct Message;

// All prefixes padded inside brackets to match "[ERROR]" (5 chars inside)

impl Message {
    pub fn say(msg: &str) {
        println!("{} {}", "[HTTPD]".blue(), msg);
    }

    pub fn cheer(msg: &str) {
        println!("{} {}", "[OK   ]".green(), msg);
    }

    pub fn complain(msg: &str) {
        eprintln!("{} {}", "[WARN ]".yellow(), msg);
    }

    pub fn oops(msg: &str) {
        eprintln!("{} {}", "[ERROR]".red(), msg);
    }

    pub fn print_listening(addr: SocketAddr, root: &Path) {
        Self::cheer(&format!("listening on {}", addr.to_string().bold()));
        println!("{:8}{} {}", "", "root:".dimmed(), root.display());
        println!(
            "{:8}{} {}",
            "",
            "public:".dimmed(),
            root.join(crate::handlers::static_files::PUBLIC_DIR).display()
        );
    }

    /// print the route table, flagging tags no handler is registered for
    pub fn print_routes(routes: &RouteTable, handlers: &HandlerRegistry) {
        if routes.is_empty() {
            Self::complain("no routes configured; every request except / gets 400");
            return;
        }

        Self::say(&format!("routes ({}):", routes.len()));

        let width = routes.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
        for (prefix, tag) in routes.iter() {
            let marker = if handlers.contains(tag) {
                "[+]".green()
            } else {
                "[!]".red()
            };
            let note = if handlers.contains(tag) {
                String::new()
            } else {
                format!("  {}", "no handler registered, answers 500".red())
            };

            let prefix_padded = format!("{:width$}", prefix, width = width);
            println!(
                "  {} {}  {} {}{}",
                marker,
                prefix_padded.bold(),
                "->".dimmed(),
                tag,
                note
            );
        }
    }

    /// number of routes whose tag has no handler
    pub fn unsupported_count(routes: &RouteTable, handlers: &HandlerRegistry) -> usize {
        routes
            .iter()
            .filter(|(_, tag)| !handlers.contains(tag))
            .count()
    }
}

/// General info message
#[macro_export]
macro_rules! say {
    ($msg:expr) => {
        $crate::message::Message::say($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::message::Message::say(&format!($fmt, $($arg)*))
    };
}

/// Success message
#[macro_export]
macro_rules! cheer {
    ($msg:expr) => {
        $crate::message::Message::cheer($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::message::Message::cheer(&format!($fmt, $($arg)*))
    };
}

/// Warning message
#[macro_export]
macro_rules! complain {
    ($msg:expr) => {
        $crate::message::Message::complain($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::message::Message::complain(&format!($fmt, $($arg)*))
    };
}

/// Error message
#[macro_export]
macro_rules! oops {
    ($msg:expr) => {
        $crate::message::Message::oops($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::message::Message::oops(&format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_accept_plain_and_formatted_messages() {
        crate::say!("plain");
        crate::cheer!("port {}", 8080);
        crate::complain!("{} route(s) unsupported", 2);
        crate::oops!("failed to bind port {}: {}", 8080, "in use");
        crate::oops!("plain");
    }

    #[test]
    fn test_unsupported_count() {
        let routes = RouteTable::new()
            .with_route("/echo", "echo_dir")
            .with_route("/proxy", "proxy_dir")
            .with_route("/cgi", "cgi_dir");
        let handlers = HandlerRegistry::with_defaults("/srv");

        assert_eq!(Message::unsupported_count(&routes, &handlers), 2);
        assert_eq!(
            Message::unsupported_count(&RouteTable::new(), &handlers),
            0
        );
    }
}
