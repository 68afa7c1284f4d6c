use super::*;
use chess::MoveGen;
use rand::seq::IndexedRandom;

/// Plays a uniformly random legal move
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMover;

impl RandomMover {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MoveGenerator for RandomMover {
    async fn best_move(&self, request: MoveRequest) -> EngineResult<ChessMove> {
        let moves: Vec<ChessMove> = MoveGen::new_legal(&request.board).collect();
        let choice = {
            let mut rng = rand::rng();
            moves.choose(&mut rng).copied()
        };
        choice.ok_or(EngineError::NoMove)
    }

    fn name(&self) -> &str {
        "random"
    }
}
