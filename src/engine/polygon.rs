use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::engine::adapter::{Engine, EngineFactory};
use crate::engine::genome::Genome;
use crate::engine::raster::rasterize;
use crate::engine::scoring::{mse_accuracy, sad_accuracy};
use crate::foundation::core::AlgorithmVariant;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::session::config::StartConfig;

/// Pixel comparison used to score candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Sum of absolute differences.
    #[default]
    Sad,
    /// Sum of squared differences.
    Mse,
}

/// Search strategy selected by the session's [`AlgorithmVariant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// `0`: three parents, mutated children, elitist selection with a wildcard.
    EvolutionStrategy,
    /// `1`: single walker with temperature-controlled acceptance.
    SimulatedAnnealing,
    /// `2`: population-level differential recombination.
    DifferentialEvolution,
}

impl Strategy {
    /// Map the wire integer onto a strategy. Unknown values fall back to the evolution strategy.
    pub fn from_variant(v: AlgorithmVariant) -> Self {
        match v.0 {
            1 => Self::SimulatedAnnealing,
            2 => Self::DifferentialEvolution,
            _ => Self::EvolutionStrategy,
        }
    }
}

/// Tuning for [`PolygonEngine`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PolygonEngineOpts {
    /// Candidate scoring metric.
    pub metric: Metric,
    /// Evolution strategy: children produced per parent per iteration.
    pub es_children_per_parent: usize,
    /// Evolution strategy: non-improving iterations before the runner-up is shaken.
    pub es_stagnation_limit: u32,
    /// Simulated annealing: starting temperature.
    pub sa_initial_temp: f32,
    /// Simulated annealing: multiplicative cooling per iteration.
    pub sa_cooling_rate: f32,
    /// Differential evolution: population size (at least 4).
    pub de_population: usize,
    /// Differential evolution: differential weight `F`.
    pub de_mutation_factor: f32,
    /// Differential evolution: per-polygon crossover probability.
    pub de_crossover_rate: f32,
}

impl Default for PolygonEngineOpts {
    fn default() -> Self {
        Self {
            metric: Metric::Sad,
            es_children_per_parent: 5,
            es_stagnation_limit: 500,
            sa_initial_temp: 1.0,
            sa_cooling_rate: 0.99995,
            de_population: 6,
            de_mutation_factor: 0.8,
            de_crossover_rate: 0.9,
        }
    }
}

const ES_PARENTS: usize = 3;
const ES_WILDCARD_MUTATIONS: usize = 5;
const ES_SHAKE_MUTATIONS: usize = 20;
const SA_MIN_TEMP: f32 = 0.0001;
const SA_REHEAT_TEMP: f32 = 0.1;

#[derive(Clone)]
struct Scored {
    score: f32,
    genome: Genome,
}

struct ScoreCtx<'a> {
    target: &'a [u8],
    metric: Metric,
}

impl ScoreCtx<'_> {
    fn score(&self, genome: Genome) -> Scored {
        let pixels = rasterize(&genome);
        let score = match self.metric {
            Metric::Sad => sad_accuracy(self.target, &pixels),
            Metric::Mse => mse_accuracy(self.target, &pixels),
        };
        Scored { score, genome }
    }
}

enum State {
    Evolution {
        parents: Vec<Scored>,
        stagnant: u32,
    },
    Annealing {
        current: Scored,
        best: Scored,
        temperature: f32,
    },
    Differential {
        population: Vec<Scored>,
    },
}

/// Reference engine: approximates the target with a stack of translucent polygons.
///
/// Deterministic for a fixed `seed`. Candidate scoring runs on the rayon global pool.
pub struct PolygonEngine {
    target: Vec<u8>,
    width: u32,
    height: u32,
    max_iterations: u64,
    target_accuracy: f32,
    iteration: u64,
    finished: bool,
    strategy: Strategy,
    opts: PolygonEngineOpts,
    rng: Pcg32,
    state: State,
}

impl PolygonEngine {
    /// Build an engine for a validated start snapshot.
    pub fn new(cfg: &StartConfig, opts: PolygonEngineOpts) -> TesseraResult<Self> {
        cfg.validate()
            .map_err(|e| TesseraError::engine_init(e.to_string()))?;
        if opts.de_population < 4 {
            return Err(TesseraError::engine_init(
                "differential evolution needs a population of at least 4",
            ));
        }
        if opts.es_children_per_parent == 0 {
            return Err(TesseraError::engine_init(
                "evolution strategy needs at least one child per parent",
            ));
        }

        let strategy = Strategy::from_variant(cfg.session.algorithm);
        let seed = cfg.session.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let (w, h) = (cfg.width as usize, cfg.height as usize);
        let ctx = ScoreCtx {
            target: &cfg.pixels,
            metric: opts.metric,
        };

        let state = match strategy {
            Strategy::EvolutionStrategy => State::Evolution {
                parents: seed_population(&ctx, &mut rng, ES_PARENTS, w, h),
                stagnant: 0,
            },
            Strategy::SimulatedAnnealing => {
                let start = ctx.score(Genome::random(&mut rng, w, h));
                State::Annealing {
                    best: start.clone(),
                    current: start,
                    temperature: opts.sa_initial_temp,
                }
            }
            Strategy::DifferentialEvolution => State::Differential {
                population: seed_population(&ctx, &mut rng, opts.de_population, w, h),
            },
        };

        tracing::debug!(?strategy, seed, width = w, height = h, "polygon engine ready");
        Ok(Self {
            target: cfg.pixels.clone(),
            width: cfg.width,
            height: cfg.height,
            max_iterations: cfg.session.max_iterations,
            target_accuracy: cfg.session.target_accuracy,
            iteration: 0,
            finished: false,
            strategy,
            opts,
            rng,
            state,
        })
    }

    /// Factory producing polygon engines with fixed tuning.
    pub fn factory(opts: PolygonEngineOpts) -> PolygonEngineFactory {
        PolygonEngineFactory { opts }
    }

    /// Strategy this engine was built with.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn best(&self) -> &Scored {
        match &self.state {
            State::Evolution { parents, .. } => &parents[0],
            State::Annealing { best, .. } => best,
            State::Differential { population } => &population[0],
        }
    }

    fn check_finished(&mut self) -> bool {
        if !self.finished
            && (self.iteration >= self.max_iterations
                || self.best().score >= self.target_accuracy)
        {
            self.finished = true;
        }
        self.finished
    }

    fn advance(&mut self) {
        let ctx = ScoreCtx {
            target: &self.target,
            metric: self.opts.metric,
        };
        let (w, h) = (self.width as usize, self.height as usize);
        match &mut self.state {
            State::Evolution { parents, stagnant } => {
                evolution_step(&ctx, &self.opts, &mut self.rng, parents, stagnant)
            }
            State::Annealing {
                current,
                best,
                temperature,
            } => annealing_step(&ctx, &self.opts, &mut self.rng, current, best, temperature),
            State::Differential { population } => {
                differential_step(&ctx, &self.opts, &mut self.rng, population, w, h)
            }
        }
    }
}

impl Engine for PolygonEngine {
    fn step(&mut self, batch: u32) -> TesseraResult<Vec<u8>> {
        for _ in 0..batch {
            if self.check_finished() {
                break;
            }
            self.advance();
            self.iteration += 1;
        }
        self.check_finished();
        Ok(rasterize(&self.best().genome))
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn iteration(&self) -> u64 {
        self.iteration
    }

    fn accuracy(&self) -> f32 {
        self.best().score
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// [`EngineFactory`] for [`PolygonEngine`].
#[derive(Clone, Debug, Default)]
pub struct PolygonEngineFactory {
    opts: PolygonEngineOpts,
}

impl EngineFactory for PolygonEngineFactory {
    fn create(&self, cfg: &StartConfig) -> TesseraResult<Box<dyn Engine>> {
        Ok(Box::new(PolygonEngine::new(cfg, self.opts)?))
    }
}

fn seed_population(
    ctx: &ScoreCtx<'_>,
    rng: &mut Pcg32,
    n: usize,
    width: usize,
    height: usize,
) -> Vec<Scored> {
    let mut v: Vec<Scored> = (0..n)
        .map(|_| ctx.score(Genome::random(&mut *rng, width, height)))
        .collect();
    sort_best_first(&mut v);
    v
}

fn sort_best_first(v: &mut [Scored]) {
    v.sort_by(|a, b| b.score.total_cmp(&a.score));
}

fn mutated(mut genome: Genome, rng: &mut Pcg32, times: usize) -> Genome {
    for _ in 0..times {
        genome.mutate(rng);
    }
    genome
}

fn evolution_step(
    ctx: &ScoreCtx<'_>,
    opts: &PolygonEngineOpts,
    rng: &mut Pcg32,
    parents: &mut Vec<Scored>,
    stagnant: &mut u32,
) {
    let old_best = parents[0].score;
    let per_parent = opts.es_children_per_parent;

    // Child seeds are drawn up front so parallel scoring stays deterministic.
    let seeds: Vec<u64> = (0..parents.len() * per_parent).map(|_| rng.random()).collect();
    let current: &[Scored] = parents;
    let mut pool: Vec<Scored> = seeds
        .par_iter()
        .enumerate()
        .map(|(i, &seed)| {
            let mut child_rng = Pcg32::seed_from_u64(seed);
            let child = mutated(current[i / per_parent].genome.clone(), &mut child_rng, 1);
            ctx.score(child)
        })
        .collect();
    pool.append(parents);
    sort_best_first(&mut pool);

    let worst = pool.pop();
    let mut ranked = pool.into_iter();
    let (Some(best), Some(second), Some(worst)) = (ranked.next(), ranked.next(), worst) else {
        return;
    };
    let wildcard = ctx.score(mutated(worst.genome, rng, ES_WILDCARD_MUTATIONS));
    *parents = vec![best, second, wildcard];

    if parents[0].score > old_best {
        *stagnant = 0;
    } else {
        *stagnant += 1;
    }

    if *stagnant > opts.es_stagnation_limit {
        let shaken = mutated(parents[1].genome.clone(), rng, ES_SHAKE_MUTATIONS);
        parents[1] = ctx.score(shaken);
        *stagnant = 0;
    }
}

fn annealing_step(
    ctx: &ScoreCtx<'_>,
    opts: &PolygonEngineOpts,
    rng: &mut Pcg32,
    current: &mut Scored,
    best: &mut Scored,
    temperature: &mut f32,
) {
    let neighbour = ctx.score(mutated(current.genome.clone(), rng, 1));
    let delta = neighbour.score - current.score;
    let accept = delta > 0.0 || rng.random::<f32>() < (delta / *temperature).exp();

    if accept {
        if neighbour.score > best.score {
            *best = neighbour.clone();
        }
        *current = neighbour;
    }

    *temperature *= opts.sa_cooling_rate;
    if *temperature < SA_MIN_TEMP {
        *temperature = SA_REHEAT_TEMP;
    }
}

fn differential_step(
    ctx: &ScoreCtx<'_>,
    opts: &PolygonEngineOpts,
    rng: &mut Pcg32,
    population: &mut Vec<Scored>,
    width: usize,
    height: usize,
) {
    let n = population.len();
    let trials: Vec<Genome> = (0..n)
        .map(|i| {
            // Three distinct donors, none equal to `i`.
            let picks = rand::seq::index::sample(&mut *rng, n - 1, 3);
            let donor = |k: usize| {
                let j = picks.index(k);
                if j >= i { j + 1 } else { j }
            };
            de_trial(
                &population[donor(0)].genome,
                &population[donor(1)].genome,
                &population[donor(2)].genome,
                &population[i].genome,
                opts,
                rng,
                width,
                height,
            )
        })
        .collect();

    let scored: Vec<Scored> = trials.into_par_iter().map(|g| ctx.score(g)).collect();
    for (slot, trial) in population.iter_mut().zip(scored) {
        if trial.score > slot.score {
            *slot = trial;
        }
    }
    sort_best_first(population);
}

/// `trial = base + F * (d1 - d2)` per polygon, crossed over with `target`.
#[allow(clippy::too_many_arguments)]
fn de_trial(
    base: &Genome,
    d1: &Genome,
    d2: &Genome,
    target: &Genome,
    opts: &PolygonEngineOpts,
    rng: &mut Pcg32,
    width: usize,
    height: usize,
) -> Genome {
    let mut trial = base.clone();
    let f = opts.de_mutation_factor;
    let n = trial
        .polygons
        .len()
        .min(d1.polygons.len())
        .min(d2.polygons.len())
        .min(target.polygons.len());
    let x_max = (width.max(1) - 1) as f32;
    let y_max = (height.max(1) - 1) as f32;

    for i in 0..n {
        if rng.random::<f32>() >= opts.de_crossover_rate {
            trial.polygons[i] = target.polygons[i].clone();
            continue;
        }
        let (b, p1, p2) = (&base.polygons[i], &d1.polygons[i], &d2.polygons[i]);
        let poly = &mut trial.polygons[i];
        for c in 0..4 {
            let v = b.colour[c] as f32 + f * (p1.colour[c] as f32 - p2.colour[c] as f32);
            poly.colour[c] = v.clamp(0.0, 255.0) as u8;
        }
        let pts = poly.points.len().min(p1.points.len()).min(p2.points.len());
        for k in 0..pts {
            let x = b.points[k].0 + f * (p1.points[k].0 - p2.points[k].0);
            let y = b.points[k].1 + f * (p1.points[k].1 - p2.points[k].1);
            poly.points[k] = (x.clamp(0.0, x_max), y.clamp(0.0, y_max));
        }
    }
    trial
}

#[cfg(test)]
#[path = "../../tests/unit/engine/polygon.rs"]
mod tests;
