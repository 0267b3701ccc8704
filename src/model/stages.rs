//! Ordered composition of named layers
//!
//! Like `nn::SequentialT`, but every stage carries a name so the
//! intermediate shapes of a network can be inspected.

use tch::{nn, nn::ModuleT, Tensor};

/// Output shape recorded after one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageShape {
    pub name: String,
    pub shape: Vec<i64>,
}

#[derive(Debug)]
struct Stage {
    name: String,
    layer: Box<dyn ModuleT>,
}

/// A left-to-right chain of layers
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer
    pub fn add<M: ModuleT + 'static>(mut self, name: impl Into<String>, layer: M) -> Self {
        self.stages.push(Stage {
            name: name.into(),
            layer: Box::new(layer),
        });
        self
    }

    /// Append a parameter-free function
    pub fn add_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: 'static + Fn(&Tensor) -> Tensor + Send,
    {
        self.add(name, nn::func(f))
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stage has been added
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in application order
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run the chain and record the output shape of every stage
    pub fn trace(&self, xs: &Tensor, train: bool) -> Vec<StageShape> {
        let mut shapes = Vec::with_capacity(self.stages.len());
        let mut current = xs.shallow_clone();

        for stage in &self.stages {
            current = stage.layer.forward_t(&current, train);
            shapes.push(StageShape {
                name: stage.name.clone(),
                shape: current.size(),
            });
        }

        shapes
    }
}

impl ModuleT for Pipeline {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let mut stages = self.stages.iter();
        match stages.next() {
            None => xs.shallow_clone(),
            Some(first) => stages.fold(first.layer.forward_t(xs, train), |acc, stage| {
                stage.layer.forward_t(&acc, train)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::new();
        let xs = Tensor::randn([2, 3], (Kind::Float, Device::Cpu));

        assert!(pipeline.is_empty());
        assert!(pipeline.forward_t(&xs, false).equal(&xs));
    }

    #[test]
    fn test_stages_apply_left_to_right() {
        let pipeline = Pipeline::new()
            .add_fn("add_one", |xs| xs + 1.0)
            .add_fn("double", |xs| xs * 2.0);

        let xs = Tensor::zeros([1], (Kind::Float, Device::Cpu));
        let out = pipeline.forward_t(&xs, false);

        assert_eq!(out.double_value(&[0]), 2.0);
        assert_eq!(pipeline.names(), vec!["add_one", "double"]);
    }

    #[test]
    fn test_trace_records_each_stage() {
        let pipeline = Pipeline::new()
            .add_fn("flatten", |xs| xs.flatten(1, -1))
            .add_fn("first", |xs| xs.narrow(1, 0, 1));

        let xs = Tensor::ones([4, 2, 3], (Kind::Float, Device::Cpu));
        let shapes = pipeline.trace(&xs, false);

        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].shape, vec![4, 6]);
        assert_eq!(shapes[1].name, "first");
        assert_eq!(shapes[1].shape, vec![4, 1]);
    }
}
