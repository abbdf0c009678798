use crate::core::keypair::Keypair;
use crate::core::program::{Program, ProgramErrorDef};
use crate::core::provider::Provider;
use crate::domain::model::{AccountMeta, Pubkey, TxSignature};
use crate::programs::system::SYSTEM_PROGRAM_ID;
use crate::utils::error::{HarnessError, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use std::fmt;

pub const PROGRAM_NAME: &str = "tic_tac_toe";
pub const PROGRAM_ID: &str = "Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS";
pub const ACCOUNT_TYPE: &str = "Game";
/// players 64 + turn 1 + board 9 * 2 + state 33
pub const GAME_MAXIMUM_SIZE: usize = 116;
pub const GAME_ACCOUNT_SPACE: usize = GAME_MAXIMUM_SIZE + 8;

pub const TILE_OUT_OF_BOUNDS: u32 = 300;
pub const TILE_ALREADY_SET: u32 = 301;
pub const GAME_ALREADY_OVER: u32 = 302;
pub const NOT_PLAYERS_TURN: u32 = 303;

pub const ERRORS: &[ProgramErrorDef] = &[
    ProgramErrorDef { code: TILE_OUT_OF_BOUNDS, name: "TileOutOfBounds", msg: "Tile is outside the 3x3 board" },
    ProgramErrorDef { code: TILE_ALREADY_SET, name: "TileAlreadySet", msg: "Tile has already been played" },
    ProgramErrorDef { code: GAME_ALREADY_OVER, name: "GameAlreadyOver", msg: "Game is no longer active" },
    ProgramErrorDef { code: NOT_PLAYERS_TURN, name: "NotPlayersTurn", msg: "It is not this player's turn" },
];

fn rule_error(code: u32) -> HarnessError {
    match ERRORS.iter().find(|def| def.code == code) {
        Some(def) => HarnessError::ProgramError {
            code,
            name: def.name.to_string(),
            msg: def.msg.to_string(),
        },
        None => HarnessError::ProgramError {
            code,
            name: "Unknown".to_string(),
            msg: format!("custom program error: {:#x}", code),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Sign {
    X,
    O,
}

impl Sign {
    fn for_player(index: usize) -> Self {
        if index == 0 {
            Sign::X
        } else {
            Sign::O
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, BorshSerialize, BorshDeserialize)]
pub enum GameState {
    #[default]
    Active,
    Tie,
    Won { winner: Pubkey },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Tile {
    pub row: u8,
    pub column: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Game {
    pub players: [Pubkey; 2],
    pub turn: u8,
    pub board: [[Option<Sign>; 3]; 3],
    pub state: GameState,
}

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

impl Game {
    /// State right after `setup_game`.
    pub fn new(player_one: Pubkey, player_two: Pubkey) -> Self {
        Self {
            players: [player_one, player_two],
            turn: 1,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == GameState::Active
    }

    fn current_player_index(&self) -> usize {
        (self.turn.saturating_sub(1) % 2) as usize
    }

    pub fn current_player(&self) -> Pubkey {
        self.players[self.current_player_index()]
    }

    pub fn play(&mut self, tile: &Tile) -> Result<()> {
        if !self.is_active() {
            return Err(rule_error(GAME_ALREADY_OVER));
        }
        let next_turn = self
            .turn
            .checked_add(1)
            .ok_or_else(|| HarnessError::decode("turn counter overflow"))?;
        if tile.row > 2 || tile.column > 2 {
            return Err(rule_error(TILE_OUT_OF_BOUNDS));
        }

        let sign = Sign::for_player(self.current_player_index());
        let cell = &mut self.board[tile.row as usize][tile.column as usize];
        if cell.is_some() {
            return Err(rule_error(TILE_ALREADY_SET));
        }
        *cell = Some(sign);

        self.update_state();
        if self.is_active() {
            self.turn = next_turn;
        }
        Ok(())
    }

    fn is_winning_trio(&self, trio: &[(usize, usize); 3]) -> bool {
        let [a, b, c] = trio;
        self.board[a.0][a.1].is_some()
            && self.board[a.0][a.1] == self.board[b.0][b.1]
            && self.board[b.0][b.1] == self.board[c.0][c.1]
    }

    fn update_state(&mut self) {
        if LINES.iter().any(|line| self.is_winning_trio(line)) {
            self.state = GameState::Won {
                winner: self.current_player(),
            };
            return;
        }
        if self.board.iter().flatten().all(Option::is_some) {
            self.state = GameState::Tie;
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.board.iter().enumerate() {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| match cell {
                    Some(Sign::X) => "X",
                    Some(Sign::O) => "O",
                    None => ".",
                })
                .collect();
            writeln!(f, " {} ", cells.join(" | "))?;
            if i < 2 {
                writeln!(f, "---+---+---")?;
            }
        }
        match self.state {
            GameState::Active => write!(f, "turn {}: {} to move", self.turn, self.current_player()),
            GameState::Tie => write!(f, "tie"),
            GameState::Won { winner } => write!(f, "won by {}", winner),
        }
    }
}

pub struct TicTacToe {
    program: Program,
}

impl TicTacToe {
    pub fn new(program: Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Creates the game account; the wallet becomes player one.
    pub async fn setup_game(
        &self,
        provider: &Provider,
        game: &Keypair,
        player_two: &Pubkey,
    ) -> Result<TxSignature> {
        self.program
            .rpc(
                provider,
                "setup_game",
                player_two,
                vec![
                    AccountMeta::writable(game.pubkey(), true),
                    AccountMeta::writable(provider.wallet_pubkey(), true),
                    AccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
                ],
                &[game],
            )
            .await
    }

    /// Plays `tile` as the wallet after checking the move against the fetched game.
    pub async fn play(&self, provider: &Provider, game: &Pubkey, tile: Tile) -> Result<TxSignature> {
        let mut current = self.fetch_game(provider, game).await?;
        if current.current_player() != provider.wallet_pubkey() {
            return Err(rule_error(NOT_PLAYERS_TURN));
        }
        current.play(&tile)?;

        self.program
            .rpc(
                provider,
                "play",
                &tile,
                vec![
                    AccountMeta::writable(*game, false),
                    AccountMeta::readonly(provider.wallet_pubkey(), true),
                ],
                &[],
            )
            .await
    }

    pub async fn fetch_game(&self, provider: &Provider, game: &Pubkey) -> Result<Game> {
        self.program.fetch_account(provider, game, ACCOUNT_TYPE).await
    }
}
