//! Currency converter widget state.
//!
//! The converter holds a source and target currency, an amount and the last
//! computed result. Rial prices for both currencies come from a
//! [`RateProvider`]; the result is `amount * from_price / to_price`,
//! rounded to two decimals.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use wgt_types::CurrencyCode;

use crate::error::StateResult;
use crate::rates::RateProvider;

/// Convert `amount` between two currencies given their rial prices.
///
/// Returns `None` when any operand is zero or not finite.
pub fn convert(amount: f64, from_price: f64, to_price: f64) -> Option<f64> {
    let usable = |v: f64| v.is_finite() && v != 0.0;
    if !(usable(amount) && usable(from_price) && usable(to_price)) {
        return None;
    }
    Some(((amount * from_price / to_price) * 100.0).round() / 100.0)
}

/// Fraction digits used when displaying an amount in `code`.
pub fn display_decimals(code: &CurrencyCode) -> usize {
    if code.is_rial_denominated() {
        0
    } else {
        3
    }
}

/// Format `value` with the fraction digits appropriate for `code`.
pub fn format_amount(value: f64, code: &CurrencyCode) -> String {
    format!("{:.*}", display_decimals(code), value)
}

/// Observable converter state.
#[derive(Clone, Debug, PartialEq)]
pub struct ConverterState {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: f64,
    /// Last successful conversion; kept while a new one cannot be computed.
    pub converted: f64,
    pub from_price: Option<f64>,
    pub to_price: Option<f64>,
}

impl ConverterState {
    fn recompute(&mut self) {
        if let (Some(from), Some(to)) = (self.from_price, self.to_price) {
            if let Some(converted) = convert(self.amount, from, to) {
                self.converted = converted;
            }
        }
    }
}

impl Default for ConverterState {
    fn default() -> Self {
        Self {
            from: CurrencyCode::from_static("EUR"),
            to: CurrencyCode::from_static("USD"),
            amount: 1.0,
            converted: 0.0,
            from_price: None,
            to_price: None,
        }
    }
}

/// Converter bound to a rate source.
pub struct CurrencyConverter {
    state: watch::Sender<ConverterState>,
    rates: Arc<dyn RateProvider>,
}

impl CurrencyConverter {
    pub fn new(rates: Arc<dyn RateProvider>) -> Self {
        Self::with_state(rates, ConverterState::default())
    }

    pub fn with_state(rates: Arc<dyn RateProvider>, state: ConverterState) -> Self {
        let (state, _) = watch::channel(state);
        Self { state, rates }
    }

    pub fn state(&self) -> ConverterState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ConverterState> {
        self.state.subscribe()
    }

    /// Change the source currency. Its price is unknown until the next
    /// [`refresh`](Self::refresh).
    pub fn set_from(&self, code: CurrencyCode) {
        self.state.send_if_modified(|s| {
            if s.from == code {
                return false;
            }
            s.from = code;
            s.from_price = None;
            true
        });
    }

    /// Change the target currency. Its price is unknown until the next
    /// [`refresh`](Self::refresh).
    pub fn set_to(&self, code: CurrencyCode) {
        self.state.send_if_modified(|s| {
            if s.to == code {
                return false;
            }
            s.to = code;
            s.to_price = None;
            true
        });
    }

    pub fn set_amount(&self, amount: f64) {
        self.state.send_modify(|s| {
            s.amount = amount;
            s.recompute();
        });
    }

    /// Exchange source and target in one transition.
    pub fn swap(&self) {
        self.state.send_modify(|s| {
            std::mem::swap(&mut s.from, &mut s.to);
            std::mem::swap(&mut s.from_price, &mut s.to_price);
            s.recompute();
        });
    }

    /// Fetch both quotes concurrently and recompute.
    ///
    /// Quotes are dropped if the currency pair changed while they were in
    /// flight.
    pub async fn refresh(&self) -> StateResult<()> {
        let (from, to) = {
            let s = self.state.borrow();
            (s.from.clone(), s.to.clone())
        };
        let (from_quote, to_quote) =
            tokio::join!(self.rates.quote(&from), self.rates.quote(&to));
        let from_price = from_quote?.map(|q| q.rial_price);
        let to_price = to_quote?.map(|q| q.rial_price);

        let applied = self.state.send_if_modified(|s| {
            if s.from != from || s.to != to {
                return false;
            }
            s.from_price = from_price;
            s.to_price = to_price;
            s.recompute();
            true
        });
        if !applied {
            debug!(%from, %to, "discarding quotes for a superseded pair");
        }
        Ok(())
    }

    /// Value of the entered amount in rial.
    pub fn rial_equivalent(&self) -> Option<f64> {
        let s = self.state.borrow();
        s.from_price.map(|price| price * s.amount)
    }
}

impl fmt::Debug for CurrencyConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyConverter")
            .field("state", &*self.state.borrow())
            .finish()
    }
}
