use crate::error::Result;
use crate::logic::assignment::Assignment;
use crate::logic::encoding::Encoding;
use crate::logic::registry::Var;
use crate::logic::theory::Theory;
use itertools::iproduct;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

pub type Coin = u8;
pub type Position = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CoinProp {
    /// The first coin is worth less than the second.
    Lt(Coin, Coin),
    /// The coin sits at the position, counting from the least valuable end.
    At(Coin, Position),
}

impl Display for CoinProp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lt(a, b) => write!(f, "c{a}<c{b}"),
            Self::At(c, p) => write!(f, "c{c}@p{p}"),
        }
    }
}

/// `n` coins laid out in `n` positions in increasing value.
///
/// The base theory states that "less than" is a strict total order on the
/// coins, that every coin has exactly one position and every position exactly
/// one coin, and that neighbouring positions respect the order. Observations
/// are then added with [`CoinOrdering::assert_less`].
#[derive(Debug, Clone)]
pub struct CoinOrdering {
    encoding: Encoding<CoinProp>,
    num_coins: u8,
}

impl CoinOrdering {
    /// Builds the base theory for coins `1..=num_coins`.
    ///
    /// # Errors
    ///
    /// Propagates registry errors, which the fixed labels never trigger.
    pub fn new(num_coins: u8) -> Result<Self> {
        let mut ordering = Self {
            encoding: Encoding::new(),
            num_coins,
        };
        ordering.add_order_axioms()?;
        ordering.add_placement_axioms()?;
        Ok(ordering)
    }

    #[must_use]
    pub const fn coins(&self) -> RangeInclusive<Coin> {
        1..=self.num_coins
    }

    #[must_use]
    pub const fn positions(&self) -> RangeInclusive<Position> {
        1..=self.num_coins
    }

    /// # Errors
    ///
    /// As for [`Encoding::var`].
    pub fn lt(&mut self, a: Coin, b: Coin) -> Result<Var> {
        self.encoding.var(CoinProp::Lt(a, b))
    }

    /// # Errors
    ///
    /// As for [`Encoding::var`].
    pub fn at(&mut self, coin: Coin, pos: Position) -> Result<Var> {
        self.encoding.var(CoinProp::At(coin, pos))
    }

    fn add_order_axioms(&mut self) -> Result<()> {
        for c in self.coins() {
            let lt = self.lt(c, c)?;
            self.encoding.add_constraint(!lt)?;
        }

        for (a, b) in iproduct!(self.coins(), self.coins()).filter(|(a, b)| a < b) {
            let (ab, ba) = (self.lt(a, b)?, self.lt(b, a)?);
            self.encoding.add_exactly_one([ab, ba])?;
        }

        for (a, b, c) in iproduct!(self.coins(), self.coins(), self.coins()) {
            let (ab, bc, ac) = (self.lt(a, b)?, self.lt(b, c)?, self.lt(a, c)?);
            self.encoding.add_constraint((ab & bc) >> ac)?;
        }
        Ok(())
    }

    fn add_placement_axioms(&mut self) -> Result<()> {
        for (p, a, b) in iproduct!(1..self.num_coins, self.coins(), self.coins()) {
            let (here, next, lt) = (self.at(a, p)?, self.at(b, p + 1)?, self.lt(a, b)?);
            self.encoding.add_constraint((here & next) >> lt)?;
        }

        for c in self.coins() {
            let slots = self
                .positions()
                .map(|p| self.at(c, p))
                .collect::<Result<Vec<_>>>()?;
            self.encoding.add_exactly_one(slots)?;
        }

        for p in self.positions() {
            let occupants = self
                .coins()
                .map(|c| self.at(c, p))
                .collect::<Result<Vec<_>>>()?;
            self.encoding.add_exactly_one(occupants)?;
        }
        Ok(())
    }

    /// Records the observation that coin `a` is worth less than coin `b`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::AlreadyCompiled`] after [`CoinOrdering::compile`].
    pub fn assert_less(&mut self, a: Coin, b: Coin) -> Result<()> {
        let lt = self.lt(a, b)?;
        self.encoding.add_constraint(lt)
    }

    #[must_use]
    pub const fn encoding(&self) -> &Encoding<CoinProp> {
        &self.encoding
    }

    /// For constraints beyond pairwise observations.
    pub const fn encoding_mut(&mut self) -> &mut Encoding<CoinProp> {
        &mut self.encoding
    }

    /// # Errors
    ///
    /// [`crate::Error::AlreadyCompiled`] on a second call.
    pub fn compile(&mut self) -> Result<Theory> {
        self.encoding.compile()
    }

    /// Every placement proposition, in registration order.
    #[must_use]
    pub fn placements(&self) -> Vec<Var> {
        self.encoding
            .variables_matching(|k| matches!(k, CoinProp::At(..)))
    }

    /// The coin at each position, least valuable first. `None` marks a
    /// position the assignment leaves empty.
    #[must_use]
    pub fn decode(&self, solution: &Assignment) -> Vec<Option<Coin>> {
        self.positions()
            .map(|p| {
                self.coins().find(|&c| {
                    self.encoding
                        .get(&CoinProp::At(c, p))
                        .is_some_and(|v| solution.is_true(v))
                })
            })
            .collect()
    }
}
