//! Parsing of real Twitch traffic.

use volpesbot::auth::{Role, Sender};
use volpesbot::{Message, MessageParseError};

const CHAT: &str = "@badge-info=subscriber/14;badges=moderator/1,subscriber/12;color=#FF4500;display-name=GrayFox96;emotes=;id=b34ccfc7-4977-403a-8a94-33c6bac34fb8;mod=1;room-id=1337;tmi-sent-ts=1616874384402;user-type=mod :grayfox96!grayfox96@grayfox96.tmi.twitch.tv PRIVMSG #volpesbot :hey @volpesbot, what's up?\r\n";

#[test]
fn test_privmsg_with_tags() {
    let msg = Message::parse(CHAT).unwrap();
    assert_eq!(msg.command, "PRIVMSG");
    assert_eq!(msg.channel, "#volpesbot");
    assert_eq!(msg.text(), "hey @volpesbot, what's up?");
    assert_eq!(msg.source_nickname(), Some("grayfox96"));
    assert_eq!(msg.prefix.host(), Some("grayfox96.tmi.twitch.tv"));
    assert_eq!(msg.tag("display-name"), Ok("GrayFox96"));
    assert_eq!(msg.tag("emotes"), Ok(""));
    assert_eq!(msg.tag("tmi-sent-ts"), Ok("1616874384402"));
    assert_eq!(msg.tag("client-nonce").unwrap_err().key, "client-nonce");
}

#[test]
fn test_sender_from_tags() {
    let msg = Message::parse(CHAT).unwrap();
    let sender = Sender::from_message(&msg, "someoneelse");
    assert!(sender.is_moderator());
    assert!(!sender.is_broadcaster());
    assert_eq!(sender.role(), Role::Moderator);
    assert_eq!(sender.display_name(), "GrayFox96");

    let owner = Sender::from_message(&msg, "grayfox96");
    assert_eq!(owner.role(), Role::Owner);
}

#[test]
fn test_server_lines() {
    let ping = Message::parse("PING :tmi.twitch.tv").unwrap();
    assert_eq!(ping.command, "PING");
    assert!(ping.prefix.is_empty());
    assert_eq!(ping.text(), "tmi.twitch.tv");

    let motd = Message::parse(":tmi.twitch.tv 376 volpesbot :>").unwrap();
    assert!(motd.is_numeric());
    assert_eq!(motd.channel, "volpesbot");
    assert_eq!(motd.prefix.nick(), Some("tmi.twitch.tv"));
    assert_eq!(motd.prefix.user(), None);

    let notice = Message::parse(
        "@msg-id=msg_banned :tmi.twitch.tv NOTICE #somechannel :You are permanently banned from talking in somechannel.",
    )
    .unwrap();
    assert_eq!(notice.command, "NOTICE");
    assert_eq!(notice.tag("msg-id"), Ok("msg_banned"));
}

#[test]
fn test_part_echo_has_no_trailing() {
    let msg =
        Message::parse(":volpesbot!volpesbot@volpesbot.tmi.twitch.tv PART #grayfox96").unwrap();
    assert_eq!(msg.command, "PART");
    assert_eq!(msg.channel, "#grayfox96");
    assert_eq!(msg.trailing, None);
}

#[test]
fn test_whisper_targets_nick() {
    let msg = Message::parse(
        "@badges=;display-name=Viewer :viewer!viewer@viewer.tmi.twitch.tv WHISPER volpesbot :psst",
    )
    .unwrap();
    assert_eq!(msg.channel, "volpesbot");
    assert_eq!(msg.text(), "psst");
    assert_eq!(msg.tag("badges"), Ok(""));
}

#[test]
fn test_malformed_lines() {
    assert_eq!(Message::parse("\r\n"), Err(MessageParseError::EmptyMessage));

    for line in [":prefix.only", "@a=1", "@a=1 :prefix", ":nick :trailing"] {
        assert!(
            matches!(
                Message::parse(line),
                Err(MessageParseError::MalformedLine { .. })
            ),
            "{line:?} should be rejected"
        );
    }
}

#[test]
fn test_display_drops_terminator() {
    let msg = Message::parse(CHAT).unwrap();
    assert_eq!(msg.to_string(), CHAT.trim_end());
}
