use referee_core::{AssignmentStatus, Participant, RoundAssignment};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentRow {
    pub season_id: String,
    pub round_number: i64,
    pub round_id: String,
    pub match_id: String,
    pub game_id: String,
    pub group_id: String,
    pub player1_id: String,
    pub player1_email: String,
    pub player2_id: String,
    pub player2_email: String,
    pub status: String,
}

impl AssignmentRow {
    pub fn into_domain(self) -> RoundAssignment {
        RoundAssignment {
            season_id: self.season_id,
            round_number: u32::try_from(self.round_number).unwrap_or_default(),
            round_id: self.round_id,
            match_id: self.match_id,
            game_id: self.game_id,
            group_id: self.group_id,
            player1: Participant::new(self.player1_id, self.player1_email),
            player2: Participant::new(self.player2_id, self.player2_email),
            status: AssignmentStatus::parse(&self.status).unwrap_or_default(),
        }
    }
}

impl From<&RoundAssignment> for AssignmentRow {
    fn from(a: &RoundAssignment) -> Self {
        Self {
            season_id: a.season_id.clone(),
            round_number: i64::from(a.round_number),
            round_id: a.round_id.clone(),
            match_id: a.match_id.clone(),
            game_id: a.game_id.clone(),
            group_id: a.group_id.clone(),
            player1_id: a.player1.id.clone(),
            player1_email: a.player1.email.clone(),
            player2_id: a.player2.id.clone(),
            player2_email: a.player2.email.clone(),
            status: a.status.as_str().to_string(),
        }
    }
}
