//! Pretrained checkpoint lookup and loading.

use crate::{common::*, config::Depth};

/// Published ResNet-vd checkpoints, one per depth.
pub fn checkpoint_url(depth: Depth) -> &'static str {
    match depth {
        Depth::R18 => "https://github.com/lyuwenyu/storage/releases/download/v0.1/ResNet18_vd_pretrained_from_paddle.pth",
        Depth::R34 => "https://github.com/lyuwenyu/storage/releases/download/v0.1/ResNet34_vd_pretrained_from_paddle.pth",
        Depth::R50 => "https://github.com/lyuwenyu/storage/releases/download/v0.1/ResNet50_vd_ssld_v2_pretrained_from_paddle.pth",
        Depth::R101 => "https://github.com/lyuwenyu/storage/releases/download/v0.1/ResNet101_vd_ssld_pretrained_from_paddle.pth",
    }
}

/// The file name under which the checkpoint of `depth` is cached.
pub fn checkpoint_file_name(depth: Depth) -> &'static str {
    let url = checkpoint_url(depth);
    url.rsplit('/').next().unwrap_or(url)
}

/// Loads a checkpoint in the var store format into `vs`.
///
/// Entries in the file without a matching variable, such as batch norm
/// `num_batches_tracked` counters, are ignored. Variables missing from the
/// file are an error in strict mode, otherwise they are reported by a warning
/// and returned.
pub fn load_pretrained<P>(vs: &mut nn::VarStore, path: P, strict: bool) -> Result<Vec<String>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ensure!(
        path.is_file(),
        "checkpoint file '{}' does not exist",
        path.display()
    );

    let mut missing = vs
        .load_partial(path)
        .with_context(|| format!("failed to load checkpoint '{}'", path.display()))?;
    missing.sort();

    if !missing.is_empty() {
        if strict {
            bail!(
                "checkpoint '{}' lacks {} variables, including '{}'",
                path.display(),
                missing.len(),
                missing[0]
            );
        }
        warn!(
            "checkpoint '{}' lacks {} variables: {}",
            path.display(),
            missing.len(),
            missing.iter().join(", ")
        );
    }

    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PResNetInit;

    #[test]
    fn checkpoint_file_name_test() {
        assert_eq!(
            checkpoint_file_name(Depth::R50),
            "ResNet50_vd_ssld_v2_pretrained_from_paddle.pth"
        );
        assert!(Depth::ALL
            .iter()
            .all(|&depth| checkpoint_url(depth).ends_with(checkpoint_file_name(depth))));
    }

    #[test]
    fn load_pretrained_round_trip_test() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("presnet18.ot");

        let init = PResNetInit {
            num_stages: 2,
            return_idx: vec![0, 1],
            freeze_norm: true,
            ..PResNetInit::new(Depth::R18)
        };

        let source_vs = nn::VarStore::new(Device::Cpu);
        let _source = init.clone().build(&source_vs.root())?;
        tch::no_grad(|| {
            source_vs.variables()["conv1.conv1_1.norm.running_mean"]
                .shallow_clone()
                .fill_(0.25);
        });

        // batch norm counters written by trainers have no frozen counterpart
        {
            let root = source_vs.root();
            let stem = &root / "conv1";
            let stem_norm = &(&stem / "conv1_1") / "norm";
            let layers = &root / "res_layers";
            let blocks = &(&layers / 0) / "blocks";
            let block_norm = &(&(&blocks / 0) / "branch2a") / "norm";
            let _ = stem_norm.zeros_no_train("num_batches_tracked", &[]);
            let _ = block_norm.zeros_no_train("num_batches_tracked", &[]);
        }
        assert!(source_vs
            .variables()
            .contains_key("res_layers.0.blocks.0.branch2a.norm.num_batches_tracked"));
        source_vs.save(&file)?;

        // a deeper target has variables the checkpoint lacks
        let mut target_vs = nn::VarStore::new(Device::Cpu);
        let _target = PResNetInit {
            num_stages: 3,
            return_idx: vec![2],
            ..init
        }
        .build(&target_vs.root())?;

        let missing = load_pretrained(&mut target_vs, &file, false)?;
        assert!(!missing.is_empty());
        assert!(missing.iter().all(|name| name.starts_with("res_layers.2")));
        assert!(!missing
            .iter()
            .any(|name| name.contains("num_batches_tracked")));

        let variables = target_vs.variables();
        let loaded = &variables["conv1.conv1_1.norm.running_mean"];
        assert!((f64::from(loaded.mean(Kind::Float)) - 0.25).abs() < 1e-6);
        assert!(!variables
            .keys()
            .any(|name| name.ends_with("num_batches_tracked")));

        assert!(load_pretrained(&mut target_vs, &file, true).is_err());
        assert!(load_pretrained(&mut target_vs, dir.path().join("missing.ot"), false).is_err());
        Ok(())
    }
}
