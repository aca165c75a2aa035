//! Lottery state.

use crate::{LotteryConfig, LotteryError};
use lottery_core::{
    Action, Ledger, LotteryEvent, RandomnessClient, NUM_WORDS, REQUEST_CONFIRMATIONS,
};
use lottery_types::{Address, GasLane, LotteryState, RandomWord, RequestId, SubscriptionId, Wei};
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// Correlation record for the outstanding randomness request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RandomnessRequest {
    pub request_id: RequestId,
    /// Time `perform_upkeep` submitted the request.
    pub requested_at: Duration,
    /// Entrants at the time of the request.
    pub player_count: usize,
    /// Balance that will be paid to the winner.
    pub prize: Wei,
}

/// The mutable round aggregate. One instance lives for the lifetime of the
/// lottery and is reset in place after each payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Round {
    pub state: LotteryState,

    /// Entrants in entry order. Entry order is payout index order.
    pub players: Vec<Address>,

    /// Entry fees collected this round.
    pub balance: Wei,

    /// Start of the current round.
    pub last_timestamp: Duration,

    /// Most recent winner, retained across rounds.
    pub recent_winner: Option<Address>,

    /// Set exactly while `state` is CALCULATING.
    pub pending: Option<RandomnessRequest>,

    /// Completed rounds.
    pub round_number: u64,
}

impl Round {
    fn new(now: Duration) -> Self {
        Self {
            state: LotteryState::Open,
            players: Vec::new(),
            balance: Wei::ZERO,
            last_timestamp: now,
            recent_winner: None,
            pending: None,
            round_number: 0,
        }
    }
}

/// Result of [`Lottery::check_upkeep`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    /// Passed back verbatim to `perform_upkeep`. Always empty.
    pub perform_data: Vec<u8>,
}

/// Lottery state machine.
///
/// Collects entries while OPEN, requests randomness once the interval has
/// elapsed, and pays the whole balance to one entrant when the randomness
/// arrives. Every command either completes fully or leaves the round
/// untouched.
#[derive(Debug)]
pub struct Lottery {
    /// Address funds are held under and events are emitted from.
    address: Address,

    config: LotteryConfig,

    round: Round,

    /// Current time.
    now: Duration,
}

impl Lottery {
    /// Deploy a lottery at `address`, opening the first round at `now`.
    pub fn new(address: Address, config: LotteryConfig, now: Duration) -> Result<Self, LotteryError> {
        config.validate()?;
        tracing::info!(
            address = %address,
            entrance_fee = %config.entrance_fee,
            interval_secs = config.interval.as_secs(),
            "Lottery deployed"
        );
        Ok(Self {
            address,
            config,
            round: Round::new(now),
            now,
        })
    }

    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════════════

    /// Record `player` as an entrant paying `value`.
    ///
    /// The fee check runs before the state check. Any overpayment is kept.
    #[instrument(skip(self), fields(player = %player, value = %value))]
    pub fn enter(&mut self, player: Address, value: Wei) -> Result<Vec<Action>, LotteryError> {
        if value < self.config.entrance_fee {
            return Err(LotteryError::SendMoreToEnterLottery {
                sent: value,
                required: self.config.entrance_fee,
            });
        }
        if !self.round.state.is_open() {
            return Err(LotteryError::LotteryNotOpen);
        }

        let balance = self
            .round
            .balance
            .checked_add(value)
            .ok_or(LotteryError::BalanceOverflow)?;
        self.round.balance = balance;
        self.round.players.push(player);

        tracing::debug!(players = self.round.players.len(), balance = %balance, "Player entered");

        Ok(vec![Action::emit(
            self.address,
            LotteryEvent::LotteryEnter { player },
        )])
    }

    /// Whether a draw is due. Read-only.
    pub fn check_upkeep(&self, _check_data: &[u8]) -> UpkeepCheck {
        let elapsed = self.now.saturating_sub(self.round.last_timestamp);
        let upkeep_needed = self.round.state.is_open()
            && elapsed >= self.config.interval
            && !self.round.players.is_empty()
            && !self.round.balance.is_zero();
        UpkeepCheck {
            upkeep_needed,
            perform_data: Vec::new(),
        }
    }

    /// Close entry and request randomness for the draw.
    ///
    /// Nothing changes if the client rejects the submission.
    #[instrument(skip(self, perform_data, client), fields(players = self.round.players.len()))]
    pub fn perform_upkeep(
        &mut self,
        perform_data: &[u8],
        client: &mut impl RandomnessClient,
    ) -> Result<Vec<Action>, LotteryError> {
        if !self.check_upkeep(perform_data).upkeep_needed {
            return Err(LotteryError::UpkeepNotNeeded {
                balance: self.round.balance,
                num_players: self.round.players.len(),
                state: self.round.state,
            });
        }

        let request = self.config.randomness_request();
        let request_id = client.request_random_words(self.address, &request)?;

        self.round.state = LotteryState::Calculating;
        self.round.pending = Some(RandomnessRequest {
            request_id,
            requested_at: self.now,
            player_count: self.round.players.len(),
            prize: self.round.balance,
        });
        tracing::info!(request_id = %request_id, "Requested lottery winner");

        Ok(vec![Action::emit(
            self.address,
            LotteryEvent::RequestedLotteryWinner { request_id },
        )])
    }

    /// Oracle callback: pick the winner, pay out and open the next round.
    ///
    /// The round is reset before the payout. If the payout fails the prior
    /// round is restored and the request stays pending.
    #[instrument(skip(self, random_words, ledger), fields(request_id = %request_id))]
    pub fn fulfill_random_words(
        &mut self,
        request_id: RequestId,
        random_words: &[RandomWord],
        ledger: &mut impl Ledger,
    ) -> Result<Vec<Action>, LotteryError> {
        match self.round.pending {
            Some(pending) if pending.request_id == request_id => {}
            _ => return Err(LotteryError::NonexistentRequest(request_id)),
        }
        let word = random_words
            .first()
            .ok_or(LotteryError::MissingRandomWords)?;

        // Entry is closed while calculating, so players is non-empty here.
        let player_count = self.round.players.len() as u64;
        let winner_index = word.reduce(player_count) as usize;
        let winner = self.round.players[winner_index];
        let prize = self.round.balance;

        let snapshot = self.round.clone();
        self.round.recent_winner = Some(winner);
        self.round.players.clear();
        self.round.state = LotteryState::Open;
        self.round.last_timestamp = self.now.max(snapshot.last_timestamp);
        self.round.balance = Wei::ZERO;
        self.round.pending = None;
        self.round.round_number += 1;

        if let Err(source) = ledger.transfer(self.address, winner, prize) {
            tracing::warn!(winner = %winner, error = %source, "Payout failed, round restored");
            self.round = snapshot;
            return Err(LotteryError::TransferFailed { winner, source });
        }

        tracing::info!(
            winner = %winner,
            winner_index,
            prize = %prize,
            round = self.round.round_number,
            "Winner picked"
        );

        Ok(vec![Action::emit(
            self.address,
            LotteryEvent::WinnerPicked { winner },
        )])
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &LotteryConfig {
        &self.config
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn entrance_fee(&self) -> Wei {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn vrf_coordinator(&self) -> Address {
        self.config.vrf_coordinator
    }

    pub fn gas_lane(&self) -> GasLane {
        self.config.gas_lane
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.config.subscription_id
    }

    pub fn callback_gas_limit(&self) -> u32 {
        self.config.callback_gas_limit
    }

    pub fn lottery_state(&self) -> LotteryState {
        self.round.state
    }

    pub fn number_of_players(&self) -> usize {
        self.round.players.len()
    }

    pub fn player(&self, index: usize) -> Result<Address, LotteryError> {
        self.round
            .players
            .get(index)
            .copied()
            .ok_or(LotteryError::PlayerIndexOutOfBounds {
                index,
                len: self.round.players.len(),
            })
    }

    pub fn players(&self) -> &[Address] {
        &self.round.players
    }

    pub fn recent_winner(&self) -> Option<Address> {
        self.round.recent_winner
    }

    pub fn last_timestamp(&self) -> Duration {
        self.round.last_timestamp
    }

    pub fn balance(&self) -> Wei {
        self.round.balance
    }

    pub fn pending_request(&self) -> Option<&RandomnessRequest> {
        self.round.pending.as_ref()
    }

    pub fn round_number(&self) -> u64 {
        self.round.round_number
    }

    /// Current time as seen by the lottery.
    pub fn block_timestamp(&self) -> Duration {
        self.now
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }
}
