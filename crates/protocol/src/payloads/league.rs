use serde_json::Value;

use crate::validation::Checker;

const ASSIGNMENT_ROLES: [&str; 3] = ["player1", "player2", "referee"];

const REPORT_STATUSES: [&str; 6] = [
    "completed",
    "aborted",
    "abandoned",
    "timeout",
    "CANCELLED_ALL_PLAYERS_MALFUNCTION",
    "COMPLETED_SINGLE_PLAYER",
];

pub(crate) fn start_season(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "broadcast_id");
    c.require_str(p, "season_id");
    c.require_str(p, "season_name");
    c.require_one_of(p, "game_type", &["Q21"]);
    c.require_positive_int(p, "total_rounds");
    c.require_iso_datetime(p, "registration_deadline");
}

pub(crate) fn registration_request(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "season_id");
    c.require_str(p, "user_id");
    c.require_str(p, "participant_id");
    c.require_str(p, "display_name");
}

pub(crate) fn registration_response(c: &mut Checker<'_>, p: &Value) {
    if c.require_one_of(p, "status", &["accepted", "rejected"]) == Some("rejected") {
        c.require_str(p, "reason");
    }
}

pub(crate) fn assignment_table(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "broadcast_id");
    c.require_str(p, "season_id");
    c.require_str(p, "league_id");
    c.require_positive_int(p, "total_count");
    if let Some(items) = c.require_list(p, "assignments", 1) {
        c.each_object(items, "assignments", |a, item| {
            a.require_one_of(item, "role", &ASSIGNMENT_ROLES);
            a.require_str(item, "email");
            if let Some(game_id) = a.require_str(item, "game_id") {
                a.game_id_format(game_id, "game_id");
            }
            a.require_str(item, "group_id");
        });
    }
}

pub(crate) fn group_assignment_ack(c: &mut Checker<'_>, p: &Value) {
    c.require_one_of(p, "status", &["acknowledged"]);
    c.require_str(p, "referee_id");
    c.require_str(p, "season_id");
    c.require_non_negative_int(p, "assignments_received");
}

pub(crate) fn new_round(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "broadcast_id");
    c.require_str(p, "round_id");
    c.require_positive_int(p, "round_number");
    if let Some(table) = c.optional(p, "participant_lookup_table") {
        if let Some(items) = c.list(table, "participant_lookup_table", 0) {
            for (i, item) in items.iter().enumerate() {
                c.non_empty_string(item, &format!("participant_lookup_table[{i}]"));
            }
        }
    }
}

pub(crate) fn end_round(c: &mut Checker<'_>, p: &Value) {
    c.require_positive_int(p, "round_number");
}

pub(crate) fn end_season(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "season_id");
}

pub(crate) fn keep_alive(_c: &mut Checker<'_>, _p: &Value) {}

pub(crate) fn keep_alive_response(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "referee_id");
    c.require_one_of(p, "status", &["alive"]);
}

pub(crate) fn critical_pause(c: &mut Checker<'_>, p: &Value) {
    if let Some(reason) = c.optional(p, "reason") {
        c.non_empty_string(reason, "reason");
    }
}

pub(crate) fn critical_control(_c: &mut Checker<'_>, _p: &Value) {}

pub(crate) fn round_results(c: &mut Checker<'_>, p: &Value) {
    c.require_positive_int(p, "round_number");
    if let Some(results) = c.optional(p, "results") {
        c.list(results, "results", 0);
    }
}

pub(crate) fn match_result_report(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    let status = c.require_one_of(p, "status", &REPORT_STATUSES);
    c.require_bool(p, "is_draw");
    let min_scores = match status {
        Some("CANCELLED_ALL_PLAYERS_MALFUNCTION") => 0,
        _ => 1,
    };
    if let Some(scores) = c.require_list(p, "scores", min_scores) {
        c.each_object(scores, "scores", |s, score| {
            s.require_str(score, "participant_id");
            s.require_str(score, "email");
            s.require_non_negative_int(score, "league_points");
            s.require_number_in_range(score, "private_score", 0.0, 100.0);
        });
    }
}

pub(crate) fn league_completed(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "broadcast_id");
    c.require_str(p, "season_id");
    if let Some(standings) = c.require_list(p, "final_standings", 1) {
        c.each_object(standings, "final_standings", |s, row| {
            s.require_positive_int(row, "rank");
            s.require_str(row, "participant_id");
            s.require_str(row, "display_name");
            s.require_non_negative_int(row, "total_points");
        });
    }
}

pub(crate) fn error_response(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "error_code");
    c.require_str(p, "error_message");
    c.require_bool(p, "recoverable");
}
