use std::fmt::{Display, Formatter};

use chrono::Utc;
use msgstore::Message;
use rand::prelude::*;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

const MID_PRICE: f64 = 10000.0;
const STD_DEV: f64 = 200.0;
const MAX_QUANTITY: u32 = 100;

/// Header naming the instrument a quote belongs to. Quotes are grouped by
/// it.
pub const SYMBOL_HEADER: &str = "symbol";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: u32,
    pub quantity: u32,
    pub quoted_at: i64,
}

impl Quote {
    /// For demonstration purposes, generate a random quote for one of the
    /// symbols.
    pub fn random(symbols: &[&str]) -> Self {
        let mut rng = thread_rng();
        let symbol = symbols.choose(&mut rng).copied().unwrap_or("UNKNOWN");
        let price = Normal::new(MID_PRICE, STD_DEV)
            .map(|dist| dist.sample(&mut rng))
            .unwrap_or(MID_PRICE)
            .max(1.0) as u32;
        Self {
            symbol: symbol.to_string(),
            price,
            quantity: rng.gen_range(1..=MAX_QUANTITY),
            quoted_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::new(serde_json::to_vec(self)?).with_header(SYMBOL_HEADER, &self.symbol))
    }

    pub fn from_message(message: &Message) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(message.payload())
    }
}

/// Volume weighted summary of a batch of quotes.
#[derive(Debug, Default)]
pub struct QuoteSummary {
    count: usize,
    quantity: u64,
    notional: u64,
}

impl QuoteSummary {
    pub fn add(&mut self, quote: &Quote) {
        self.count += 1;
        self.quantity += quote.quantity as u64;
        self.notional += quote.price as u64 * quote.quantity as u64;
    }

    pub fn vwap(&self) -> Option<f64> {
        (self.quantity > 0).then(|| self.notional as f64 / self.quantity as f64)
    }
}

impl<'a> FromIterator<&'a Quote> for QuoteSummary {
    fn from_iter<T: IntoIterator<Item = &'a Quote>>(iter: T) -> Self {
        let mut summary = Self::default();
        iter.into_iter().for_each(|q| summary.add(q));
        summary
    }
}

impl Display for QuoteSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.vwap() {
            Some(vwap) => write!(
                f,
                "{} quotes, quantity {} @ vwap {:.2}",
                self.count, self.quantity, vwap
            ),
            None => write!(f, "no quotes"),
        }
    }
}
