//! End-to-end dispatch through `Bot::handle_line`.

mod common;

use common::{chat, config, Harness, OWNER};
use volpesbot::event::Category;
use volpesbot::Exit;

#[tokio::test]
async fn test_ping_answered_with_pong() {
    let mut h = Harness::new();
    h.feed("PING :tmi.twitch.tv\r\n").await;
    assert_eq!(h.sent(), vec!["PONG :tmi.twitch.tv"]);
}

#[tokio::test]
async fn test_end_of_motd_joins_once() {
    let mut h = Harness::joined().await;
    h.feed(":tmi.twitch.tv 376 volpesbot :>").await;
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn test_blank_and_malformed_lines_are_dropped() {
    let mut h = Harness::new();
    assert_eq!(h.feed("\r\n").await, None);
    assert_eq!(h.feed(":only.a.prefix").await, None);
    assert!(h.sent().is_empty());

    let warnings: Vec<_> = h
        .sink
        .events()
        .into_iter()
        .filter(|e| e.category == Category::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn test_unhandled_command_is_ignored() {
    let mut h = Harness::new();
    h.feed(":tmi.twitch.tv CAP * ACK :twitch.tv/tags").await;
    assert!(h.sent().is_empty());
    assert!(h.bot.registry().stats().iter().all(|(_, n)| *n == 0));
}

#[tokio::test]
async fn test_denied_command_has_no_side_effect() {
    let mut h = Harness::joined().await;
    let line = chat("randomviewer", "", "#grayfox96", "!joinchannel #elsewhere");
    h.feed(&line).await;

    assert_eq!(
        h.sent(),
        vec!["PRIVMSG #grayfox96 :You can't use that command."]
    );
    assert!(!h.bot.session().is_joined("#elsewhere"));
    assert_eq!(h.bot.commands().denied_count(), 1);
}

#[tokio::test]
async fn test_moderator_joins_and_parts_channel() {
    let mut h = Harness::joined().await;

    h.feed(&chat("modguy", "moderator/1", "#grayfox96", "!joinchannel Elsewhere"))
        .await;
    assert_eq!(
        h.sent(),
        vec![
            "JOIN #elsewhere",
            "PRIVMSG #grayfox96 :Joined channel #elsewhere",
        ]
    );
    assert!(h.bot.session().is_joined("#elsewhere"));
    assert!(h.bot.session().config().channels["#elsewhere"].connect_on_startup);

    h.feed(&chat("modguy", "moderator/1", "#grayfox96", "!joinchannel #elsewhere"))
        .await;
    assert_eq!(
        h.sent(),
        vec!["PRIVMSG #grayfox96 :Already joined channel #elsewhere"]
    );

    h.feed(&chat("modguy", "moderator/1", "#grayfox96", "!leavechannel #elsewhere"))
        .await;
    assert_eq!(
        h.sent(),
        vec!["PART #elsewhere", "PRIVMSG #grayfox96 :Left channel #elsewhere"]
    );
    assert!(!h.bot.session().is_joined("#elsewhere"));
    assert!(!h.bot.session().config().channels["#elsewhere"].connect_on_startup);
}

#[tokio::test]
async fn test_part_refuses_own_and_current_channel() {
    let mut h = Harness::joined().await;

    h.feed(&chat(OWNER, "broadcaster/1", "#grayfox96", "!partchannel #volpesbot"))
        .await;
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("I can't leave my own channel"));

    h.feed(&chat(OWNER, "broadcaster/1", "#grayfox96", "!partchannel #grayfox96"))
        .await;
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("use the command in my chat"));
    assert!(h.bot.session().is_joined("#grayfox96"));
}

#[tokio::test]
async fn test_join_without_argument_prints_usage() {
    let mut h = Harness::joined().await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!joinchannel")).await;
    assert_eq!(
        h.sent(),
        vec!["PRIVMSG #grayfox96 :Usage: joinchannel <channel>"]
    );
}

#[tokio::test]
async fn test_quit_sets_exit_flag() {
    let mut h = Harness::joined().await;
    let exit = h.feed(&chat(OWNER, "", "#volpesbot", "!quit")).await;
    assert_eq!(exit, Some(Exit::Quit));
    assert_eq!(h.sent(), vec!["PRIVMSG #volpesbot :Closing the bot"]);
}

#[tokio::test]
async fn test_restart_sets_exit_flag() {
    let mut h = Harness::joined().await;
    let exit = h
        .feed(&chat("modguy", "moderator/1", "#volpesbot", "!restart"))
        .await;
    assert_eq!(exit, Some(Exit::Restart));
    assert_eq!(h.sent(), vec!["PRIVMSG #volpesbot :Restarting the bot"]);
}

#[tokio::test]
async fn test_reconnect_requests_restart() {
    let mut h = Harness::new();
    assert_eq!(
        h.feed(":tmi.twitch.tv RECONNECT").await,
        Some(Exit::Restart)
    );
}

#[tokio::test]
async fn test_detached_ping_replies_with_uptime() {
    let mut h = Harness::joined().await;
    h.feed(&chat("randomviewer", "", "#grayfox96", "!ping")).await;
    let reply = h.next_sent().await;
    assert!(reply.starts_with("PRIVMSG #grayfox96 :Uptime: 0:00:0"), "{reply}");
}

#[tokio::test]
async fn test_connected_channels_lists_joined() {
    let mut h = Harness::joined().await;
    h.feed(&chat("randomviewer", "", "#grayfox96", "!ConnectedChannels"))
        .await;
    assert_eq!(
        h.sent(),
        vec!["PRIVMSG #grayfox96 :I'm connected to these channels: #grayfox96, #volpesbot."]
    );
}

#[tokio::test]
async fn test_unknown_sub_command_is_silent() {
    let mut h = Harness::joined().await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!nosuchthing")).await;
    assert!(h.sent().is_empty());
    assert_eq!(h.bot.commands().denied_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_temptimer_fires_after_delay() {
    let mut h = Harness::joined().await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!temptimer")).await;
    assert!(h.sent().is_empty());

    let start = tokio::time::Instant::now();
    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :timer ended");
    assert!(start.elapsed() >= std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn test_dispatch_counts_per_command() {
    let mut h = Harness::new();
    h.feed("PING :a").await;
    h.feed("PING :b").await;
    let stats = h.bot.registry().stats();
    assert!(stats.contains(&("PING", 2)));
}

async fn banlist_harness(content: Option<&str>) -> (Harness, tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("banlist.txt");
    if let Some(content) = content {
        std::fs::write(&path, content).unwrap();
    }
    let path = path.display().to_string();

    let mut config = config();
    config.bot.banlist_path = path.clone();
    (Harness::joined_with(config).await, dir, path)
}

const BANLIST: &str = "alice\nbob\n\ncarol\ndave\n";

#[tokio::test]
async fn test_banlist_bans_one_based_slice() {
    let (mut h, _dir, _) = banlist_harness(Some(BANLIST)).await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!banlist 2 3")).await;

    // Lines 2..5: bob, a blank line, carol. Stops on line 5.
    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :/ban bob");
    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :/ban carol");
    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :5");
    assert!(h.sent().is_empty());
}

#[tokio::test]
async fn test_banlist_stops_at_end_of_file() {
    let (mut h, _dir, _) = banlist_harness(Some(BANLIST)).await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!banlist 4 10")).await;

    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :/ban carol");
    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :/ban dave");
    assert_eq!(h.next_sent().await, "PRIVMSG #grayfox96 :5");
}

#[tokio::test]
async fn test_banlist_missing_file() {
    let (mut h, _dir, path) = banlist_harness(None).await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!banlist 1 5")).await;

    assert_eq!(
        h.next_sent().await,
        format!("PRIVMSG #grayfox96 :Can't find or access file {}", path)
    );
}

#[tokio::test]
async fn test_banlist_without_range_prints_usage() {
    let (mut h, _dir, _) = banlist_harness(Some(BANLIST)).await;
    h.feed(&chat(OWNER, "", "#grayfox96", "!banlist 3")).await;

    assert_eq!(
        h.next_sent().await,
        "PRIVMSG #grayfox96 :Usage: banlist <start> <limit>"
    );
}

#[tokio::test]
async fn test_banlist_denied_for_viewers() {
    let (mut h, _dir, _) = banlist_harness(Some(BANLIST)).await;
    h.feed(&chat("randomviewer", "", "#grayfox96", "!banlist 1 5")).await;

    assert_eq!(
        h.sent(),
        vec!["PRIVMSG #grayfox96 :You can't use that command."]
    );
}
