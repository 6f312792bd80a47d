use serde_json::Value;

use crate::validation::Checker;

pub const ANSWER_CHOICES: [&str; 5] = ["A", "B", "C", "D", "Not Relevant"];
pub const BREAKDOWN_KEYS: [&str; 4] = [
    "opening_sentence_score",
    "sentence_justification_score",
    "associative_word_score",
    "word_justification_score",
];
const OPTION_KEYS: [&str; 4] = ["A", "B", "C", "D"];

pub(crate) fn warmup_call(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_str(p, "warmup_question");
    c.require_iso_datetime(p, "deadline");
}

pub(crate) fn warmup_response(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_str(p, "answer");
    c.require_str(p, "auth_token");
}

pub(crate) fn round_start(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_str(p, "book_name");
    c.require_str(p, "book_hint");
    c.require_str(p, "association_word");
    c.require_positive_int(p, "questions_required");
    c.require_iso_datetime(p, "deadline");
}

pub(crate) fn questions_batch(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_str(p, "auth_token");
    c.require_positive_int(p, "total_questions");
    if let Some(questions) = c.require_list(p, "questions", 1) {
        c.each_object(questions, "questions", |q, question| {
            q.require_positive_int(question, "question_number");
            q.require_str(question, "question_text");
            if let Some(options) = q.required(question, "options") {
                if q.object(options, "options").is_some() {
                    let mut o = q.child("options");
                    for key in OPTION_KEYS {
                        o.require_str(options, key);
                    }
                }
            }
        });
    }
}

pub(crate) fn answers_batch(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_iso_datetime(p, "deadline");
    if let Some(answers) = c.require_list(p, "answers", 1) {
        c.each_object(answers, "answers", |a, answer| {
            a.require_positive_int(answer, "question_number");
            a.require_one_of(answer, "answer", &ANSWER_CHOICES);
        });
    }
}

pub(crate) fn guess_submission(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_str(p, "auth_token");
    c.require_str(p, "opening_sentence");
    c.require_str(p, "associative_word");
    if let Some(text) = c.require_str(p, "sentence_justification") {
        c.word_count_range(text, "sentence_justification", 30, 50);
    }
    if let Some(text) = c.require_str(p, "word_justification") {
        c.word_count_range(text, "word_justification", 20, 30);
    }
    if let Some(confidence) = c.optional(p, "confidence") {
        c.number_in_range(confidence, "confidence", 0.0, 1.0);
    }
}

pub(crate) fn score_feedback(c: &mut Checker<'_>, p: &Value) {
    c.require_str(p, "match_id");
    c.require_number_in_range(p, "league_points", 0.0, 3.0);
    c.require_number_in_range(p, "private_score", 0.0, 100.0);
    if let Some(breakdown) = c.required(p, "breakdown") {
        if c.object(breakdown, "breakdown").is_some() {
            let mut b = c.child("breakdown");
            for key in BREAKDOWN_KEYS {
                b.require_number_in_range(breakdown, key, 0.0, 100.0);
            }
        }
    }
    if let Some(feedback) = c.optional(p, "feedback") {
        c.object(feedback, "feedback");
    }
}
