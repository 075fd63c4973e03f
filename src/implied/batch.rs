//! Quote-level batch inversion.
//!
//! Each quote is inverted independently; with the `parallel` feature the
//! map runs on the rayon thread pool. Output order matches input order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::implied::ImpliedVolSolver;
use crate::types::{ImpliedVolSample, Quote};

impl ImpliedVolSolver {
    /// Invert a single quote into a sample.
    pub fn solve_quote(&self, quote: &Quote) -> ImpliedVolSample {
        let terms = &quote.terms;
        ImpliedVolSample::new(
            terms.expiry,
            terms.strike,
            Some(terms.spot),
            self.solve(quote.market_price, terms),
        )
    }

    /// Invert every quote. Failed inversions become undefined samples;
    /// the batch itself cannot fail.
    pub fn solve_batch(&self, quotes: &[Quote]) -> Vec<ImpliedVolSample> {
        #[cfg(feature = "parallel")]
        let samples: Vec<ImpliedVolSample> =
            quotes.par_iter().map(|q| self.solve_quote(q)).collect();
        #[cfg(not(feature = "parallel"))]
        let samples: Vec<ImpliedVolSample> = quotes.iter().map(|q| self.solve_quote(q)).collect();

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_quotes = quotes.len(),
            n_undefined = samples.iter().filter(|s| !s.vol.is_defined()).count(),
            "implied vol batch complete"
        );

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContractTerms, ImpliedVol, UndefinedReason};
    use approx::assert_abs_diff_eq;

    fn quote(strike: f64, expiry: f64, vol: f64) -> Quote {
        let terms = ContractTerms::new(100.0, strike, expiry, 0.01, 0.0).unwrap();
        Quote::new(terms, Some(terms.call_price(vol)))
    }

    #[test]
    fn batch_preserves_order_and_values() {
        let quotes: Vec<Quote> = (0..40)
            .map(|i| quote(80.0 + i as f64, 0.25 + 0.01 * i as f64, 0.15 + 0.005 * i as f64))
            .collect();
        let samples = ImpliedVolSolver::default().solve_batch(&quotes);

        assert_eq!(samples.len(), quotes.len());
        for (i, (sample, q)) in samples.iter().zip(&quotes).enumerate() {
            assert_eq!(sample.strike, q.terms.strike);
            assert_eq!(sample.expiry, q.terms.expiry);
            assert_eq!(sample.spot, Some(100.0));
            let vol = sample.vol.value().unwrap();
            assert_abs_diff_eq!(vol.0, 0.15 + 0.005 * i as f64, epsilon = 1e-7);
        }
    }

    #[test]
    fn bad_quote_does_not_abort_batch() {
        let good = quote(100.0, 0.5, 0.2);
        let terms = ContractTerms::new(100.0, 100.0, 0.5, 0.01, 0.0).unwrap();
        let unachievable = Quote::new(terms, Some(150.0));
        let unpriced = Quote::new(terms, None);

        let samples = ImpliedVolSolver::default().solve_batch(&[good, unachievable, unpriced]);
        assert!(samples[0].vol.is_defined());
        assert_eq!(
            samples[1].vol,
            ImpliedVol::Undefined(UndefinedReason::UnachievablePrice)
        );
        assert_eq!(samples[2].vol.value().map(|v| v.0), Some(0.0));
    }

    #[test]
    fn empty_batch() {
        assert!(ImpliedVolSolver::default().solve_batch(&[]).is_empty());
    }
}
