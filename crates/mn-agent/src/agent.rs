//! The evolutionary search agent.
//!
//! One agent owns one trial: its configuration copy, seeded RNG, callbacks,
//! and optional metrics writer. Execution is strictly sequential; `run` and
//! `solve` block until the evaluation budget is spent.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use mn_config::ExperimentConfig;
use mn_types::{non_dominated_indices, NasResult, ObjectivePoint, SearchError};

use crate::callback::{Callback, GenerationContext};
use crate::duplicates::DuplicateEliminator;
use crate::evaluate::{Evaluator, SurrogateEvaluator};
use crate::genotype::Genotype;
use crate::writer::SummaryWriter;

/// One evaluated architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub genotype: Genotype,
    pub objectives: ObjectivePoint,
}

/// Outcome of a finished trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub run_id: Uuid,
    pub seed: u64,
    pub generations: u32,
    pub evaluations: u64,
    pub archive: Vec<Individual>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Multi-objective evolutionary search agent.
pub struct EvoAgent {
    config: ExperimentConfig,
    run_id: Uuid,
    seed: u64,
    rng: ChaCha8Rng,
    evaluator: Box<dyn Evaluator>,
    eliminator: DuplicateEliminator,
    callbacks: Vec<Box<dyn Callback>>,
    writer: Option<SummaryWriter>,
    population: Vec<Individual>,
    archive: Vec<Individual>,
    evaluations: u64,
    generation: u32,
}

impl EvoAgent {
    /// Construct an agent for one trial. The configuration is owned; callers
    /// keep their copy untouched.
    pub fn new(
        config: ExperimentConfig,
        seed: u64,
        callbacks: Vec<Box<dyn Callback>>,
        writer: Option<SummaryWriter>,
    ) -> NasResult<Self> {
        let eliminator = DuplicateEliminator::new(
            config.eliminate_duplicates,
            config.problem.search_space,
        );
        let evaluator = Box::new(SurrogateEvaluator::new(config.problem.search_space));
        Ok(Self {
            config,
            run_id: Uuid::new_v4(),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            evaluator,
            eliminator,
            callbacks,
            writer,
            population: Vec::new(),
            archive: Vec::new(),
            evaluations: 0,
            generation: 0,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn archive(&self) -> &[Individual] {
        &self.archive
    }

    /// Execute the search: initial population, then generational steps until
    /// the evaluation budget is spent.
    pub fn run(&mut self) -> NasResult<SearchReport> {
        let started_at = Utc::now();
        info!(
            run_id = %self.run_id,
            seed = self.seed,
            exp_name = %self.config.exp_name,
            problem = %self.config.problem.name,
            budget = self.config.termination.n_max_evals,
            "starting search"
        );

        for callback in &mut self.callbacks {
            callback.on_start(&self.config)?;
        }

        self.init_population()?;
        self.update_archive();
        self.emit_generation()?;

        let budget = self.config.termination.n_max_evals;
        while self.evaluations < budget {
            self.generation += 1;
            let offspring = self.make_offspring();
            if offspring.is_empty() {
                debug!(
                    generation = self.generation,
                    "no unseen offspring left, stopping early"
                );
                break;
            }
            for genotype in offspring {
                let objectives = self.evaluator.evaluate(&genotype, &self.config.problem)?;
                self.evaluations += 1;
                self.population.push(Individual {
                    genotype,
                    objectives,
                });
            }
            let target = self.config.algorithm.pop_size as usize;
            self.population = survival_select(std::mem::take(&mut self.population), target);
            self.update_archive();
            self.emit_generation()?;
        }

        self.emit_finish()?;
        let report = SearchReport {
            run_id: self.run_id,
            seed: self.seed,
            generations: self.generation,
            evaluations: self.evaluations,
            archive: self.archive.clone(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            generations = report.generations,
            evaluations = report.evaluations,
            archive = report.archive.len(),
            "search complete"
        );
        Ok(report)
    }

    /// Single deterministic execution: run the search, then report the final
    /// non-dominated set architecture by architecture.
    pub fn solve(&mut self) -> NasResult<SearchReport> {
        let report = self.run()?;
        for individual in &report.archive {
            info!(
                encoding = ?individual.genotype.ops,
                efficiency = individual.objectives.efficiency,
                error_rate = individual.objectives.error_rate,
                "non-dominated architecture"
            );
        }
        Ok(report)
    }

    fn init_population(&mut self) -> NasResult<()> {
        let space = self.config.problem.search_space;
        let target = self.config.algorithm.pop_size as usize;
        let budget = self.config.termination.n_max_evals;

        let mut rejected = 0usize;
        while self.population.len() < target && self.evaluations < budget {
            let genotype = Genotype::sample(space, &mut self.rng);
            if !self.eliminator.admit(&genotype) {
                rejected += 1;
                // The space may hold fewer distinct encodings than pop_size.
                if rejected > 10_000 {
                    break;
                }
                continue;
            }
            let objectives = self.evaluator.evaluate(&genotype, &self.config.problem)?;
            self.evaluations += 1;
            self.population.push(Individual {
                genotype,
                objectives,
            });
        }

        if self.population.is_empty() {
            return Err(SearchError::EmptyPopulation.into());
        }
        debug!(
            size = self.population.len(),
            evaluations = self.evaluations,
            "initial population evaluated"
        );
        Ok(())
    }

    /// Breed up to `n_offsprings` unseen genotypes, bounded by the remaining
    /// evaluation budget.
    fn make_offspring(&mut self) -> Vec<Genotype> {
        let space = self.config.problem.search_space;
        let crossover_prob = self.config.algorithm.crossover_prob;
        let mutation_prob = self.config.algorithm.mutation_prob;
        let remaining = self.config.termination.n_max_evals - self.evaluations;
        let target = (self.config.algorithm.n_offsprings as u64).min(remaining) as usize;

        let population = &self.population;
        let rng = &mut self.rng;
        let eliminator = &mut self.eliminator;

        let mut offspring = Vec::with_capacity(target);
        let mut rejected = 0usize;
        let patience = 20 * target.max(1);
        while offspring.len() < target && rejected < patience {
            let a = tournament(population, rng);
            let b = tournament(population, rng);
            let mut child = if rng.gen_bool(crossover_prob) {
                a.genotype.crossover(&b.genotype, rng)
            } else {
                a.genotype.clone()
            };
            child.mutate(space, mutation_prob, rng);
            if eliminator.admit(&child) {
                offspring.push(child);
            } else {
                rejected += 1;
            }
        }

        // Fall back to fresh random samples when breeding keeps rediscovering
        // known encodings.
        rejected = 0;
        while offspring.len() < target && rejected < patience {
            let genotype = Genotype::sample(space, rng);
            if eliminator.admit(&genotype) {
                offspring.push(genotype);
            } else {
                rejected += 1;
            }
        }

        offspring
    }

    /// Merge the population into the elitist archive, keeping one copy of
    /// each encoding and only non-dominated points.
    fn update_archive(&mut self) {
        let mut pool = std::mem::take(&mut self.archive);
        pool.extend(self.population.iter().cloned());

        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        pool.retain(|ind| seen.insert(ind.genotype.ops.clone()));

        let objectives: Vec<ObjectivePoint> = pool.iter().map(|ind| ind.objectives).collect();
        let front = non_dominated_indices(&objectives);
        self.archive = front.into_iter().map(|i| pool[i].clone()).collect();
    }

    fn emit_generation(&mut self) -> NasResult<()> {
        let mut ctx = GenerationContext {
            generation: self.generation,
            evaluations: self.evaluations,
            population: &self.population,
            archive: &self.archive,
            config: &self.config,
            writer: self.writer.as_mut(),
        };
        for callback in self.callbacks.iter_mut() {
            callback.on_generation(&mut ctx)?;
        }
        Ok(())
    }

    fn emit_finish(&mut self) -> NasResult<()> {
        let mut ctx = GenerationContext {
            generation: self.generation,
            evaluations: self.evaluations,
            population: &self.population,
            archive: &self.archive,
            config: &self.config,
            writer: self.writer.as_mut(),
        };
        for callback in self.callbacks.iter_mut() {
            callback.on_finish(&mut ctx)?;
        }
        Ok(())
    }
}

/// Binary tournament under Pareto dominance.
fn tournament<'a>(population: &'a [Individual], rng: &mut ChaCha8Rng) -> &'a Individual {
    let a = &population[rng.gen_range(0..population.len())];
    let b = &population[rng.gen_range(0..population.len())];
    if b.objectives.dominates(&a.objectives) {
        b
    } else {
        a
    }
}

/// NSGA-II style survival: rank by non-dominated fronts, break the last
/// admitted front by crowding distance.
fn survival_select(pool: Vec<Individual>, target: usize) -> Vec<Individual> {
    if pool.len() <= target {
        return pool;
    }

    let mut survivors = Vec::with_capacity(target);
    let mut remaining: Vec<Individual> = pool;
    while !remaining.is_empty() && survivors.len() < target {
        let objectives: Vec<ObjectivePoint> =
            remaining.iter().map(|ind| ind.objectives).collect();
        let front = non_dominated_indices(&objectives);

        if survivors.len() + front.len() <= target {
            let front_set: HashSet<usize> = front.iter().copied().collect();
            let mut kept = Vec::with_capacity(remaining.len() - front.len());
            for (i, ind) in remaining.into_iter().enumerate() {
                if front_set.contains(&i) {
                    survivors.push(ind);
                } else {
                    kept.push(ind);
                }
            }
            remaining = kept;
        } else {
            let slots = target - survivors.len();
            let mut members: Vec<Individual> =
                front.iter().map(|&i| remaining[i].clone()).collect();
            let distances = crowding_distances(&members);
            let mut order: Vec<usize> = (0..members.len()).collect();
            order.sort_by(|&x, &y| {
                distances[y]
                    .partial_cmp(&distances[x])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            order.truncate(slots);
            order.sort_unstable();
            for i in order.into_iter().rev() {
                survivors.push(members.swap_remove(i));
            }
            break;
        }
    }
    survivors
}

/// Crowding distance over a single front (two objectives).
fn crowding_distances(front: &[Individual]) -> Vec<f64> {
    let n = front.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| {
        front[x]
            .objectives
            .efficiency
            .partial_cmp(&front[y].objectives.efficiency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let eff_span = front[order[n - 1]].objectives.efficiency
        - front[order[0]].objectives.efficiency;
    let err_span = (front[order[0]].objectives.error_rate
        - front[order[n - 1]].objectives.error_rate)
        .abs();

    let mut distances = vec![0.0; n];
    distances[order[0]] = f64::INFINITY;
    distances[order[n - 1]] = f64::INFINITY;
    for w in 1..n - 1 {
        let prev = &front[order[w - 1]].objectives;
        let next = &front[order[w + 1]].objectives;
        let mut d = 0.0;
        if eff_span > 0.0 {
            d += (next.efficiency - prev.efficiency) / eff_span;
        }
        if err_span > 0.0 {
            d += (prev.error_rate - next.error_rate).abs() / err_span;
        }
        distances[order[w]] = d;
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use mn_config::{
        AlgorithmConfig, DuplicateEliminationConfig, OutputConfig, PfReference, ProblemConfig,
        TerminationConfig,
    };
    use mn_types::{
        Dataset, DatasetSelection, EfficiencyMetric, EvalDataset, NasError, SearchSpace,
    };
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn config(n_max_evals: u64) -> ExperimentConfig {
        ExperimentConfig {
            exp_name: "moenas-tss-cifar10-flops_error".into(),
            seed: 0,
            algorithm: AlgorithmConfig {
                name: "nsga2".into(),
                pop_size: 10,
                n_offsprings: 10,
                crossover_prob: 0.9,
                mutation_prob: 0.1,
            },
            problem: ProblemConfig {
                name: "natsbench".into(),
                search_space: SearchSpace::Tss,
                dataset: DatasetSelection::Single(Dataset::Cifar10),
                epoch: 24,
                efficiency: EfficiencyMetric::Flops,
                pf_path: "pf.json".into(),
                pf_dict: PfReference {
                    dataset: EvalDataset::ImageNet16_120,
                },
            },
            termination: TerminationConfig { n_max_evals },
            eliminate_duplicates: DuplicateEliminationConfig::Structural { isomorphic: true },
            output: OutputConfig {
                root: "experiments".into(),
                exp_dir: PathBuf::new(),
                summary_dir: PathBuf::new(),
                checkpoint_dir: PathBuf::new(),
            },
        }
    }

    struct Recording {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Callback for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn on_start(&mut self, _config: &ExperimentConfig) -> NasResult<()> {
            self.log.borrow_mut().push("start");
            Ok(())
        }

        fn on_generation(&mut self, _ctx: &mut GenerationContext<'_>) -> NasResult<()> {
            self.log.borrow_mut().push("generation");
            Ok(())
        }

        fn on_finish(&mut self, _ctx: &mut GenerationContext<'_>) -> NasResult<()> {
            self.log.borrow_mut().push("finish");
            Ok(())
        }
    }

    #[test]
    fn respects_the_evaluation_budget() {
        let mut agent = EvoAgent::new(config(60), 0, Vec::new(), None).unwrap();
        let report = agent.run().unwrap();
        assert!(report.evaluations <= 60);
        assert!(report.generations >= 1);
    }

    #[test]
    fn same_seed_reproduces_the_archive() {
        let mut a = EvoAgent::new(config(80), 7, Vec::new(), None).unwrap();
        let mut b = EvoAgent::new(config(80), 7, Vec::new(), None).unwrap();
        let ra = a.run().unwrap();
        let rb = b.run().unwrap();
        assert_eq!(ra.archive, rb.archive);
        assert_eq!(ra.evaluations, rb.evaluations);
    }

    #[test]
    fn archive_is_non_dominated_and_unique() {
        let mut agent = EvoAgent::new(config(100), 3, Vec::new(), None).unwrap();
        let report = agent.run().unwrap();

        let objectives: Vec<ObjectivePoint> =
            report.archive.iter().map(|ind| ind.objectives).collect();
        let front = non_dominated_indices(&objectives);
        assert_eq!(front.len(), report.archive.len());

        let mut seen = HashSet::new();
        for ind in &report.archive {
            assert!(seen.insert(ind.genotype.ops.clone()));
        }
    }

    #[test]
    fn zero_budget_cannot_build_a_population() {
        let mut agent = EvoAgent::new(config(0), 0, Vec::new(), None).unwrap();
        let err = agent.run().unwrap_err();
        assert!(matches!(
            err,
            NasError::Search(SearchError::EmptyPopulation)
        ));
    }

    #[test]
    fn callbacks_fire_in_lifecycle_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let callbacks: Vec<Box<dyn Callback>> =
            vec![Box::new(Recording { log: Rc::clone(&log) })];
        let mut agent = EvoAgent::new(config(40), 0, callbacks, None).unwrap();
        agent.run().unwrap();

        let log = log.borrow();
        assert_eq!(log.first(), Some(&"start"));
        assert_eq!(log.last(), Some(&"finish"));
        assert!(log.iter().filter(|&&event| event == "generation").count() >= 2);
    }

    #[test]
    fn solve_matches_run_for_the_same_seed() {
        let mut a = EvoAgent::new(config(60), 11, Vec::new(), None).unwrap();
        let mut b = EvoAgent::new(config(60), 11, Vec::new(), None).unwrap();
        let ra = a.run().unwrap();
        let rb = b.solve().unwrap();
        assert_eq!(ra.archive, rb.archive);
    }

    #[test]
    fn survival_keeps_the_best_front() {
        let ind = |e: f64, r: f64, tag: u8| Individual {
            genotype: Genotype {
                ops: vec![tag, 0, 0, 0, 0, 0],
            },
            objectives: ObjectivePoint::new(e, r),
        };
        let pool = vec![
            ind(1.0, 4.0, 0),
            ind(2.0, 2.0, 1),
            ind(4.0, 1.0, 2),
            ind(5.0, 5.0, 3), // dominated
        ];
        let survivors = survival_select(pool, 3);
        assert_eq!(survivors.len(), 3);
        assert!(survivors
            .iter()
            .all(|ind| ind.objectives != ObjectivePoint::new(5.0, 5.0)));
    }

    #[test]
    fn crowding_prefers_spread() {
        let ind = |e: f64, r: f64, tag: u8| Individual {
            genotype: Genotype {
                ops: vec![tag, 0, 0, 0, 0, 0],
            },
            objectives: ObjectivePoint::new(e, r),
        };
        // A single front of four points; the two extremes plus the farther
        // interior point should survive.
        let pool = vec![
            ind(0.0, 10.0, 0),
            ind(1.0, 9.0, 1), // crowded next to the extreme
            ind(5.0, 5.0, 2),
            ind(10.0, 0.0, 3),
        ];
        let survivors = survival_select(pool, 3);
        let effs: Vec<f64> = survivors
            .iter()
            .map(|ind| ind.objectives.efficiency)
            .collect();
        assert!(effs.contains(&0.0));
        assert!(effs.contains(&10.0));
        assert!(effs.contains(&5.0));
    }
}
