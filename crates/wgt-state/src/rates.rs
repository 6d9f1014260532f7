//! Exchange-rate lookup used by the currency converter.

use std::collections::HashMap;

use async_trait::async_trait;

use wgt_types::CurrencyCode;

use crate::error::StateResult;

/// Price of one unit of a currency, expressed in rial.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyQuote {
    pub code: CurrencyCode,
    pub rial_price: f64,
}

/// Exchange-rate source.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Quote for `code`, or `None` if the source does not know it.
    async fn quote(&self, code: &CurrencyCode) -> StateResult<Option<CurrencyQuote>>;
}

/// Rate provider answering from a fixed price table.
#[derive(Clone, Debug, Default)]
pub struct StaticRates {
    prices: HashMap<CurrencyCode, f64>,
}

impl StaticRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, code: CurrencyCode, rial_price: f64) -> Self {
        self.insert(code, rial_price);
        self
    }

    pub fn insert(&mut self, code: CurrencyCode, rial_price: f64) {
        self.prices.insert(code, rial_price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(CurrencyCode, f64)> for StaticRates {
    fn from_iter<I: IntoIterator<Item = (CurrencyCode, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RateProvider for StaticRates {
    async fn quote(&self, code: &CurrencyCode) -> StateResult<Option<CurrencyQuote>> {
        Ok(self.prices.get(code).map(|&rial_price| CurrencyQuote {
            code: code.clone(),
            rial_price,
        }))
    }
}
