//! Small randomly initialised models for unit tests.

use genie_core::{DecoderConfig, HostTensor, ParameterStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) fn small_config() -> DecoderConfig {
    DecoderConfig {
        num_keys: 10,
        ..DecoderConfig::default()
    }
}

/// Parameters for `config` with a `projection`-wide input layer and
/// `hidden`-wide LSTM layers, uniform in `[-0.5, 0.5)`.
pub(crate) fn random_store(
    config: &DecoderConfig,
    projection: usize,
    hidden: usize,
    seed: u64,
) -> ParameterStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tensor = |shape: Vec<usize>| {
        let n = shape.iter().product();
        let data = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
        HostTensor::new(shape, data).unwrap()
    };

    let names = &config.names;
    let mut tensors = vec![
        (
            names.input_kernel.clone(),
            tensor(vec![config.feature_width(), projection]),
        ),
        (names.input_bias.clone(), tensor(vec![projection])),
    ];
    let mut width = projection;
    for layer in 0..config.num_layers {
        tensors.push((
            names.lstm_kernel(layer),
            tensor(vec![width + hidden, 4 * hidden]),
        ));
        tensors.push((names.lstm_bias(layer), tensor(vec![4 * hidden])));
        width = hidden;
    }
    tensors.push((
        names.output_kernel.clone(),
        tensor(vec![hidden, config.num_keys]),
    ));
    tensors.push((names.output_bias.clone(), tensor(vec![config.num_keys])));

    ParameterStore::from_tensors(tensors).unwrap()
}

/// Copy of `store` with the candidate and forget gate blocks of every LSTM
/// kernel and bias swapped.
pub(crate) fn swap_gate_blocks(store: &ParameterStore, config: &DecoderConfig) -> ParameterStore {
    let mut lstm = Vec::new();
    for layer in 0..config.num_layers {
        lstm.push(config.names.lstm_kernel(layer));
        lstm.push(config.names.lstm_bias(layer));
    }

    let tensors = store.names().map(|name| {
        let t = store.lookup(name).unwrap().clone();
        if !lstm.iter().any(|n| n == name) {
            return (name.to_string(), t);
        }
        let cols = *t.shape().last().unwrap();
        let h = cols / 4;
        let mut data = t.data().to_vec();
        for row in data.chunks_exact_mut(cols) {
            let (j, f) = row[h..3 * h].split_at_mut(h);
            j.swap_with_slice(f);
        }
        (name.to_string(), HostTensor::new(t.shape().to_vec(), data).unwrap())
    });
    ParameterStore::from_tensors(tensors.collect::<Vec<_>>()).unwrap()
}
