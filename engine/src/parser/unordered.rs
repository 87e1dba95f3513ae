//! Combinators for parsers whose events may arrive in any order.
//!
//! Each [`UnorderedParser`] gets offered the head of the stream and either
//! accepts it (consuming what it needs and producing a result) or declines.
//! A combinator keeps offering events until nothing is accepted any more, and
//! every parser that never accepted is rejected exactly once.

use anyhow::Result;
use async_trait::async_trait;

use crate::context::BattleContext;

#[async_trait]
pub trait UnorderedParser: Send {
    type Output: Send;

    /// Diagnostic name
    fn name(&self) -> &str;

    /// Try the head of the stream. `Ok(None)` if it isn't for this parser.
    async fn parse(&mut self, ctx: &mut BattleContext) -> Result<Option<Self::Output>>;

    /// Called once if the parser never accepted anything
    fn reject(self: Box<Self>, ctx: &mut BattleContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }
}

pub type BoxParser<T> = Box<dyn UnorderedParser<Output = T>>;

/// Builds the parsers of one keyed entry of a [`staged`] stage. Called again
/// whenever a speculative attempt is thrown away, so it should not add
/// reasons of its own; build them up front and hand out copies.
pub type ParserFactory<T> =
    Box<dyn FnMut(&mut BattleContext) -> Result<Vec<BoxParser<T>>> + Send>;

fn reject_all<T: Send>(ctx: &mut BattleContext, parsers: Vec<BoxParser<T>>) -> Result<()> {
    for parser in parsers {
        tracing::trace!(parser = parser.name(), "rejecting parser");
        parser.reject(ctx)?;
    }
    Ok(())
}

async fn at_end(ctx: &mut BattleContext) -> Result<bool> {
    Ok(ctx.events.peek().await?.is_none())
}

/// Run every parser to a fixed point.
///
/// Results line up with `parsers`. A round offers the head event to each
/// pending parser in order; after an acceptance the next round starts over
/// from the new head. The call ends when the stream is exhausted or a round
/// neither accepts nor consumes anything. If `filter` accepts an event first,
/// the call ends right there.
pub async fn all<T: Send>(
    ctx: &mut BattleContext,
    parsers: Vec<BoxParser<T>>,
    mut filter: Option<BoxParser<()>>,
) -> Result<Vec<Option<T>>> {
    let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None)
        .take(parsers.len())
        .collect();
    let mut pending: Vec<(usize, BoxParser<T>)> = parsers.into_iter().enumerate().collect();
    let mut filtered = false;

    'rounds: while !pending.is_empty() && !at_end(ctx).await? {
        let consumed = ctx.events.consumed();

        if let Some(filter) = filter.as_mut()
            && filter.parse(ctx).await?.is_some()
        {
            tracing::trace!(filter = filter.name(), "filter absorbed event");
            filtered = true;
            break 'rounds;
        }

        for i in 0..pending.len() {
            if let Some(output) = pending[i].1.parse(ctx).await? {
                let (index, parser) = pending.remove(i);
                tracing::trace!(parser = parser.name(), "parser accepted");
                results[index] = Some(output);
                continue 'rounds;
            }
        }

        if ctx.events.consumed() == consumed {
            break;
        }
    }

    if let Some(filter) = filter
        && !filtered
    {
        filter.reject(ctx)?;
    }
    reject_all(ctx, pending.into_iter().map(|(_, p)| p).collect())?;
    Ok(results)
}

/// Like [`all`], but stops at the first acceptance and returns the winner's
/// index with its result
pub async fn one_of<T: Send>(
    ctx: &mut BattleContext,
    parsers: Vec<BoxParser<T>>,
) -> Result<Option<(usize, T)>> {
    let mut pending: Vec<Option<BoxParser<T>>> = parsers.into_iter().map(Some).collect();
    let mut winner = None;

    'rounds: while !at_end(ctx).await? {
        let consumed = ctx.events.consumed();
        for (index, slot) in pending.iter_mut().enumerate() {
            let Some(parser) = slot else { continue };
            if let Some(output) = parser.parse(ctx).await? {
                tracing::trace!(parser = parser.name(), "parser accepted");
                *slot = None;
                winner = Some((index, output));
                break 'rounds;
            }
        }
        if ctx.events.consumed() == consumed {
            break;
        }
    }

    reject_all(ctx, pending.into_iter().flatten().collect())?;
    Ok(winner)
}

/// Run a single parser, rejecting it if it never accepts
pub async fn parse<T: Send>(ctx: &mut BattleContext, parser: BoxParser<T>) -> Result<Option<T>> {
    Ok(one_of(ctx, vec![parser]).await?.map(|(_, output)| output))
}

/// Run keyed groups of parsers whose per-key order is fixed but whose
/// interleaving between keys is decided by the events.
///
/// `stages[s]` lists, per key, how to build that key's parsers for stage `s`.
/// Every pass offers the head event to the parsers of every pending entry,
/// earliest stage first. The first entry to accept locks its key in: the rest
/// of that stage is parsed with [`all`], then each later stage of the same
/// key in order. Earlier stages of that key can no longer happen and are
/// rejected; speculative parsers of other keys are dropped and rebuilt on the
/// next pass. An event no entry accepts is offered to `passthrough`, and the
/// search goes on if it takes it. Entries still pending when nothing accepts
/// are rejected.
///
/// Results are grouped per key, in the order keys locked in.
pub async fn staged<K, T>(
    ctx: &mut BattleContext,
    stages: Vec<Vec<(K, ParserFactory<T>)>>,
    mut passthrough: Option<BoxParser<()>>,
) -> Result<Vec<(K, Vec<T>)>>
where
    K: Clone + PartialEq + Send + std::fmt::Debug,
    T: Send,
{
    let mut stages: Vec<Vec<Option<(K, ParserFactory<T>)>>> = stages
        .into_iter()
        .map(|stage| stage.into_iter().map(Some).collect())
        .collect();
    let mut results = Vec::new();
    let mut passed_through = false;

    loop {
        if at_end(ctx).await? {
            break;
        }

        let Some((stage, key, first, rest)) = lock_in(ctx, &mut stages).await? else {
            if let Some(passthrough) = passthrough.as_mut()
                && passthrough.parse(ctx).await?.is_some()
            {
                passed_through = true;
                continue;
            }
            break;
        };
        tracing::trace!(?key, stage, "staged key locked in");

        let mut outputs = vec![first];
        outputs.extend(all(ctx, rest, None).await?.into_iter().flatten());

        for (s, entries) in stages.iter_mut().enumerate() {
            let Some(entry) = entries
                .iter_mut()
                .find(|e| e.as_ref().is_some_and(|(k, _)| *k == key))
            else {
                continue;
            };
            let Some((_, mut factory)) = entry.take() else {
                continue;
            };
            let parsers = factory(ctx)?;
            if s < stage {
                reject_all(ctx, parsers)?;
            } else {
                outputs.extend(all(ctx, parsers, None).await?.into_iter().flatten());
            }
        }

        results.push((key, outputs));
    }

    for entry in stages.into_iter().flatten().flatten() {
        let (key, mut factory) = entry;
        tracing::trace!(?key, "staged entry never matched");
        let parsers = factory(ctx)?;
        reject_all(ctx, parsers)?;
    }
    if let Some(passthrough) = passthrough
        && !passed_through
    {
        passthrough.reject(ctx)?;
    }
    Ok(results)
}

type LockIn<K, T> = (usize, K, T, Vec<BoxParser<T>>);

/// Find the first pending entry whose parsers accept the head event
async fn lock_in<K: Clone, T: Send>(
    ctx: &mut BattleContext,
    stages: &mut [Vec<Option<(K, ParserFactory<T>)>>],
) -> Result<Option<LockIn<K, T>>> {
    for (s, entries) in stages.iter_mut().enumerate() {
        for slot in entries.iter_mut() {
            let Some((key, factory)) = slot else { continue };
            let mut parsers = factory(ctx)?;
            for i in 0..parsers.len() {
                if let Some(output) = parsers[i].parse(ctx).await? {
                    parsers.remove(i);
                    let key = key.clone();
                    *slot = None;
                    return Ok(Some((s, key, output, parsers)));
                }
            }
            // Speculative: dropped without rejection, rebuilt next pass
        }
    }
    Ok(None)
}
