//! Irregular repeat-accumulate LDPC code
//!
//! `H = [H1 | P]` where `H1` has weight-3 columns spread evenly over the
//! checks and `P` is the dual-diagonal accumulator, so encoding is a running
//! XOR down the check rows. Decoding is log-domain sum-product.

use crate::error::{Error, Result};
use crate::fec::{DecodeOutcome, Fec};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Data bits of the (224,112) code.
pub const HRA_112_112_DATA_BITS: usize = 112;
/// Parity bits of the (224,112) code.
pub const HRA_112_112_PARITY_BITS: usize = 112;
pub const HRA_112_112_MAX_ITER: usize = 100;

const HRA_112_112_SEED: u64 = 0x0fd3_7001;
const DATA_COLUMN_WEIGHT: usize = 3;
const LLR_CLIP: f32 = 30.0;

/// Parity-check matrix as adjacency lists.
#[derive(Debug, Clone)]
pub struct ParityCheck {
    pub check_to_var: Vec<Vec<usize>>,
    pub var_to_check: Vec<Vec<usize>>,
}

impl ParityCheck {
    pub fn num_checks(&self) -> usize {
        self.check_to_var.len()
    }

    pub fn num_vars(&self) -> usize {
        self.var_to_check.len()
    }

    /// Number of checks satisfied by `codeword`.
    pub fn satisfied_checks(&self, codeword: &[bool]) -> usize {
        self.check_to_var
            .iter()
            .filter(|vars| vars.iter().filter(|&&v| codeword[v]).count() % 2 == 0)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct IraLdpc {
    k: usize,
    h: ParityCheck,
}

impl IraLdpc {
    /// The (224,112) code used by the 700D frame.
    pub fn hra_112_112() -> Result<Self> {
        Self::new(HRA_112_112_DATA_BITS, HRA_112_112_PARITY_BITS, HRA_112_112_SEED)
    }

    /// Build an IRA code with `k` data and `m` parity bits. The data part of
    /// the graph is drawn from `seed`, so equal arguments give equal codes.
    pub fn new(k: usize, m: usize, seed: u64) -> Result<Self> {
        let edges = k * DATA_COLUMN_WEIGHT;
        if k == 0 || m < DATA_COLUMN_WEIGHT || edges % m != 0 {
            return Err(Error::InvalidConfig(format!(
                "IRA code needs k*{} divisible by m, got k={} m={}",
                DATA_COLUMN_WEIGHT, k, m
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sockets: Vec<usize> = (0..m)
            .flat_map(|r| std::iter::repeat(r).take(edges / m))
            .collect();
        sockets.shuffle(&mut rng);

        // a column may not hit the same check twice
        loop {
            let mut clean = true;
            for c in 0..k {
                let base = c * DATA_COLUMN_WEIGHT;
                while let Some(dup) = duplicate_slot(&sockets[base..base + DATA_COLUMN_WEIGHT]) {
                    let other = rng.gen_range(0..sockets.len());
                    sockets.swap(base + dup, other);
                    clean = false;
                }
            }
            if clean {
                break;
            }
        }

        let n = k + m;
        let mut check_to_var = vec![Vec::new(); m];
        let mut var_to_check = vec![Vec::new(); n];
        for c in 0..k {
            for &r in &sockets[c * DATA_COLUMN_WEIGHT..(c + 1) * DATA_COLUMN_WEIGHT] {
                check_to_var[r].push(c);
                var_to_check[c].push(r);
            }
        }
        for r in 0..m {
            // accumulator: check r ties parity r and parity r-1
            check_to_var[r].push(k + r);
            var_to_check[k + r].push(r);
            if r > 0 {
                check_to_var[r].push(k + r - 1);
                var_to_check[k + r - 1].push(r);
            }
        }

        Ok(Self {
            k,
            h: ParityCheck {
                check_to_var,
                var_to_check,
            },
        })
    }

    pub fn parity_check(&self) -> &ParityCheck {
        &self.h
    }
}

fn duplicate_slot(rows: &[usize]) -> Option<usize> {
    (1..rows.len()).find(|&i| rows[..i].contains(&rows[i]))
}

impl Fec for IraLdpc {
    fn data_bits(&self) -> usize {
        self.k
    }

    fn parity_bits(&self) -> usize {
        self.h.num_checks()
    }

    fn encode(&self, data: &[bool]) -> Result<Vec<bool>> {
        if data.len() != self.k {
            return Err(Error::InvalidInputSize {
                expected: self.k,
                actual: data.len(),
            });
        }

        let mut parity = Vec::with_capacity(self.parity_bits());
        let mut acc = false;
        for vars in &self.h.check_to_var {
            let s = vars
                .iter()
                .filter(|&&v| v < self.k)
                .fold(false, |s, &v| s ^ data[v]);
            acc ^= s;
            parity.push(acc);
        }
        Ok(parity)
    }

    fn decode(&self, llr: &[f32], max_iter: usize) -> Result<DecodeOutcome> {
        let n = self.h.num_vars();
        if llr.len() != n {
            return Err(Error::InvalidInputSize {
                expected: n,
                actual: llr.len(),
            });
        }

        let checks = &self.h.check_to_var;
        let mut v2c: Vec<Vec<f32>> = checks
            .iter()
            .map(|vars| vars.iter().map(|&v| llr[v]).collect())
            .collect();
        let mut c2v: Vec<Vec<f32>> = checks.iter().map(|vars| vec![0.0; vars.len()]).collect();

        let mut total = llr.to_vec();
        let mut hard: Vec<bool> = total.iter().map(|&l| l < 0.0).collect();
        let mut iterations = 0;

        for iter in 0..max_iter.max(1) {
            iterations = iter + 1;

            // check nodes, tanh rule
            for (ci, vars) in checks.iter().enumerate() {
                let t: Vec<f32> = v2c[ci]
                    .iter()
                    .map(|&x| (x.clamp(-LLR_CLIP, LLR_CLIP) / 2.0).tanh())
                    .collect();
                for vi in 0..vars.len() {
                    let product: f32 = t
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != vi)
                        .map(|(_, &x)| x)
                        .product();
                    let p = product.clamp(-0.999_999, 0.999_999);
                    c2v[ci][vi] = 2.0 * p.atanh();
                }
            }

            // variable nodes
            total.copy_from_slice(llr);
            for (ci, vars) in checks.iter().enumerate() {
                for (vi, &v) in vars.iter().enumerate() {
                    total[v] += c2v[ci][vi];
                }
            }
            for (ci, vars) in checks.iter().enumerate() {
                for (vi, &v) in vars.iter().enumerate() {
                    v2c[ci][vi] = total[v] - c2v[ci][vi];
                }
            }

            hard = total.iter().map(|&l| l < 0.0).collect();
            if self.h.satisfied_checks(&hard) == self.h.num_checks() {
                break;
            }
        }

        let parity_checks = self.h.satisfied_checks(&hard);
        Ok(DecodeOutcome {
            bits: hard,
            parity_checks,
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(seed: u64) -> Vec<bool> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..HRA_112_112_DATA_BITS).map(|_| rng.gen()).collect()
    }

    fn codeword(code: &IraLdpc, data: &[bool]) -> Vec<bool> {
        let mut cw = data.to_vec();
        cw.extend(code.encode(data).unwrap());
        cw
    }

    fn to_llr(bits: &[bool], mag: f32) -> Vec<f32> {
        bits.iter().map(|&b| if b { -mag } else { mag }).collect()
    }

    #[test]
    fn test_graph_shape() {
        let code = IraLdpc::hra_112_112().unwrap();
        let h = code.parity_check();
        assert_eq!(h.num_checks(), 112);
        assert_eq!(h.num_vars(), 224);
        assert_eq!(code.code_length(), 224);
        for c in 0..112 {
            let mut rows = h.var_to_check[c].clone();
            rows.sort_unstable();
            rows.dedup();
            assert_eq!(rows.len(), DATA_COLUMN_WEIGHT, "column {}", c);
        }
    }

    #[test]
    fn test_construction_is_deterministic() {
        let a = IraLdpc::hra_112_112().unwrap();
        let b = IraLdpc::hra_112_112().unwrap();
        assert_eq!(a.parity_check().check_to_var, b.parity_check().check_to_var);
    }

    #[test]
    fn test_encode_gives_codeword() {
        let code = IraLdpc::hra_112_112().unwrap();
        for seed in 0..5 {
            let cw = codeword(&code, &data(seed));
            assert_eq!(code.parity_check().satisfied_checks(&cw), 112);
        }
    }

    #[test]
    fn test_clean_decode_converges_first_iteration() {
        let code = IraLdpc::hra_112_112().unwrap();
        let cw = codeword(&code, &data(1));
        let out = code.decode(&to_llr(&cw, 4.0), HRA_112_112_MAX_ITER).unwrap();
        assert_eq!(out.bits, cw);
        assert!(out.converged(112));
        assert_eq!(out.iterations, 1);
    }

    #[test]
    fn test_corrects_flipped_bits() {
        let code = IraLdpc::hra_112_112().unwrap();
        let cw = codeword(&code, &data(2));
        let mut llr = to_llr(&cw, 3.0);
        for &i in &[5usize, 60, 130, 200] {
            llr[i] = -llr[i] * 0.3;
        }

        let out = code.decode(&llr, HRA_112_112_MAX_ITER).unwrap();
        assert!(out.converged(112));
        assert_eq!(out.bits, cw);
    }

    #[test]
    fn test_rejects_wrong_lengths() {
        let code = IraLdpc::hra_112_112().unwrap();
        assert!(code.encode(&[false; 10]).is_err());
        assert!(code.decode(&[0.0; 10], 10).is_err());
    }

    #[test]
    fn test_rejects_unbalanced_shape() {
        assert!(IraLdpc::new(10, 7, 1).is_err());
    }
}
