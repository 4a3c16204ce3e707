//! Post template catalog and weighted selection.
//!
//! A static table of post templates grouped by category. Each category
//! carries a selection weight; each template declares which API data it
//! needs before it can render. The agent picks a category by weighted
//! random draw, a template uniformly within it, fetches the declared
//! data, and substitutes `{placeholder}` slots.

use rand::RngExt;

/// Character limit of the posting target.
pub const MAX_POST_CHARS: usize = 280;

/// Data a template needs before it can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataNeed {
    /// Spot price and 24h change (`{price}`, `{change}`).
    Price,
    /// Indicator summary (`{trend}`, `{rsi}`, `{signal}`).
    TechnicalAnalysis,
    /// Highest-volume pools (`{pool}`, `{poolApr}`).
    TopPools,
    /// Best-performing coins (`{topCoin}`, `{topCoinChange}`).
    TopCoins,
    /// Yield table (`{yieldProtocol}`, `{yieldApy}`).
    YieldOpportunities,
    /// Chain activity (`{txCount}`, `{tvl}`).
    Metrics,
}

/// A renderable post template.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    /// Template text with `{placeholder}` slots.
    pub text: &'static str,
    /// Data the agent must fetch before rendering.
    pub needs: &'static [DataNeed],
}

/// A weighted group of templates.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    /// Category name, used in logs.
    pub name: &'static str,
    /// Relative selection weight.
    pub weight: u32,
    /// Templates in this category.
    pub templates: &'static [Template],
}

/// The full catalog, heaviest categories first.
pub const CATALOG: &[Category] = &[
    Category {
        name: "market-update",
        weight: 4,
        templates: &[
            Template {
                text: "ETH is trading at ${price}. 24h change: {change}%.",
                needs: &[DataNeed::Price],
            },
            Template {
                text: "Base snapshot: {txCount} txs in 24h, ${tvl} TVL. ETH at ${price}.",
                needs: &[DataNeed::Metrics, DataNeed::Price],
            },
        ],
    },
    Category {
        name: "technical-analysis",
        weight: 3,
        templates: &[
            Template {
                text: "ETH technicals: trend {trend}, RSI {rsi}.",
                needs: &[DataNeed::TechnicalAnalysis],
            },
            Template {
                text: "Momentum check on ETH: RSI {rsi}, signal {signal}.",
                needs: &[DataNeed::TechnicalAnalysis],
            },
        ],
    },
    Category {
        name: "pool-spotlight",
        weight: 2,
        templates: &[Template {
            text: "Pool to watch: {pool} at {poolApr}% APR on Base.",
            needs: &[DataNeed::TopPools],
        }],
    },
    Category {
        name: "yield-watch",
        weight: 2,
        templates: &[Template {
            text: "Best yield right now: {yieldProtocol} paying {yieldApy}% APY.",
            needs: &[DataNeed::YieldOpportunities],
        }],
    },
    Category {
        name: "top-movers",
        weight: 1,
        templates: &[Template {
            text: "Top coin on Base today: {topCoin} ({topCoinChange}%).",
            needs: &[DataNeed::TopCoins],
        }],
    },
];

/// Picks a category by weighted random draw.
pub fn pick_category<R: RngExt>(rng: &mut R) -> &'static Category {
    let total: u32 = CATALOG.iter().map(|category| category.weight).sum();
    let mut roll = rng.random_range(0..total);
    for category in CATALOG {
        if roll < category.weight {
            return category;
        }
        roll -= category.weight;
    }
    // Unreachable: roll < total and the weights sum to total.
    &CATALOG[0]
}

/// Picks a template uniformly within a category.
pub fn pick_template<R: RngExt>(rng: &mut R, category: &'static Category) -> &'static Template {
    let index = rng.random_range(0..category.templates.len());
    &category.templates[index]
}

/// Substitutes `{placeholder}` slots with gathered values.
///
/// Unmatched slots are left in place so a missing data point is visible
/// in review rather than silently blank.
#[must_use]
pub fn render(template: &Template, values: &[(&str, String)]) -> String {
    let mut text = template.text.to_owned();
    for (key, value) in values {
        text = text.replace(&format!("{{{key}}}"), value);
    }
    text
}

/// Truncates to the posting limit, marking the cut with an ellipsis.
#[must_use]
pub fn clamp_to_post_limit(text: &str) -> String {
    if text.chars().count() <= MAX_POST_CHARS {
        return text.to_owned();
    }
    let mut clamped: String = text.chars().take(MAX_POST_CHARS - 1).collect();
    clamped.push('…');
    clamped
}
